use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Seconds between background snapshots. 0 switches to synchronous
    /// mode: every successful write dumps the full state before the
    /// response goes out.
    #[serde(default = "default_store_interval_secs")]
    pub store_interval_secs: u64,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Load the snapshot back into the repository at startup.
    #[serde(default = "default_restore")]
    pub restore: bool,
    /// SQLite database file. Empty selects the in-memory repository.
    #[serde(default)]
    pub database_path: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_store_interval_secs() -> u64 {
    300
}

fn default_snapshot_path() -> String {
    "data/metrics.json".to_string()
}

fn default_restore() -> bool {
    true
}

impl ServerConfig {
    /// Loads the TOML config at `path`. A missing file resolves to the
    /// all-defaults configuration so the server runs out of the box.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ServerConfig::load("no/such/server.toml").unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.store_interval_secs, 300);
        assert_eq!(config.snapshot_path, "data/metrics.json");
        assert!(config.restore);
        assert!(config.database_path.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: ServerConfig = toml::from_str("store_interval_secs = 0").unwrap();
        assert_eq!(config.store_interval_secs, 0);
        assert_eq!(config.snapshot_path, "data/metrics.json");
    }
}
