//! One-shot sender: pushes a single metric to the collector through the
//! same encode/compress/retry path the agent uses, one HTTP call per
//! metric. Handy for smoke-testing a collector or seeding values by hand.

use anyhow::{anyhow, bail, Result};
use tracing_subscriber::EnvFilter;
use vitals_agent::sender::Sender;
use vitals_common::types::{Metric, MetricKind};

struct Cli {
    server_addr: String,
    kind: MetricKind,
    name: String,
    value: String,
}

fn usage() {
    println!(
        "Usage:\n  vitals-send [options] <kind> <name> <value>\n\nArguments:\n  kind    gauge | counter\n  name    metric ID\n  value   decimal value (integer for counter)\n\nOptions:\n  --server-addr <host:port>  collector address (default: 127.0.0.1:8080)\n  -h, --help                 show this help"
    );
}

fn parse_cli() -> Result<Option<Cli>> {
    let mut server_addr = "127.0.0.1:8080".to_string();
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--server-addr" => {
                server_addr = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --server-addr"))?;
            }
            _ => positional.push(arg),
        }
    }

    let [kind, name, value] = positional.as_slice() else {
        bail!("expected exactly three arguments: <kind> <name> <value>");
    };
    if name.is_empty() {
        bail!("metric name must not be empty");
    }

    Ok(Some(Cli {
        server_addr,
        kind: kind.parse()?,
        name: name.clone(),
        value: value.clone(),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vitals_agent=info".parse()?))
        .init();

    let Some(cli) = parse_cli().inspect_err(|_| usage())? else {
        usage();
        return Ok(());
    };

    let metric = match cli.kind {
        MetricKind::Gauge => Metric::gauge(cli.name.clone(), cli.value.parse::<f64>()?),
        MetricKind::Counter => Metric::counter(cli.name.clone(), cli.value.parse::<i64>()?),
    };

    Sender::new(&cli.server_addr).send_metric(&metric).await?;
    println!(
        "sent {} {}={} to {}",
        cli.kind, cli.name, cli.value, cli.server_addr
    );
    Ok(())
}
