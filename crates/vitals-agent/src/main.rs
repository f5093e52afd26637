use anyhow::Result;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;

use vitals_agent::config::AgentConfig;
use vitals_agent::sampler::{MetricBatch, RuntimeSampler, RUNTIME_METRICS};
use vitals_agent::sender::Sender;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vitals_agent=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());
    let config = AgentConfig::load(&config_path)?;

    tracing::info!(
        server = %config.server_addr,
        poll_secs = config.poll_interval_secs,
        report_secs = config.report_interval_secs,
        "vitals-agent starting"
    );

    let mut sampler = RuntimeSampler::new()?;
    let sender = Sender::new(&config.server_addr);
    let ticks_per_report = config.ticks_per_report();

    let mut batch = MetricBatch::default();
    let mut ticks_in_window = 0u64;
    let mut tick = interval(Duration::from_secs(config.poll_interval_secs));

    loop {
        tokio::select! {
            _ = tick.tick() => {
                sampler.refresh();
                for (name, _) in RUNTIME_METRICS {
                    match sampler.read(name) {
                        Ok(value) => batch.record_gauge(name, value),
                        Err(e) => tracing::warn!(metric = %name, error = %e, "sampling failed"),
                    }
                }
                batch.tick();
                batch.record_gauge("RandomValue", rand::random::<f64>());
                ticks_in_window += 1;

                if ticks_in_window >= ticks_per_report && !batch.is_empty() {
                    ticks_in_window = 0;
                    let metrics = batch.drain();
                    tracing::debug!(count = metrics.len(), "reporting batch");
                    if let Err(e) = sender.send_batch(&metrics).await {
                        // The batch is gone; the next cycle starts fresh.
                        tracing::warn!(error = %e, "batch dropped");
                    }
                }
            }
            _ = signal::ctrl_c() => {
                tracing::info!("shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
