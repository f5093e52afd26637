use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    /// Collector address, host:port.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

fn default_server_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_report_interval_secs() -> u64 {
    10
}

impl AgentConfig {
    /// Loads the TOML config at `path`. A missing file resolves to the
    /// all-defaults configuration so the agent runs out of the box.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&content)?;
        if config.poll_interval_secs == 0 || config.report_interval_secs == 0 {
            anyhow::bail!("poll and report intervals must be positive");
        }
        Ok(config)
    }

    /// Ticks collected per report cycle. Floor division; a report
    /// interval shorter than the poll interval still yields one tick per
    /// cycle so the loop always makes progress.
    pub fn ticks_per_report(&self) -> u64 {
        (self.report_interval_secs / self.poll_interval_secs).max(1)
    }
}
