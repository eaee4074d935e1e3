use clap::Parser;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("processor=info,analysis=info")),
        );
    tracing::subscriber::set_global_default(registry)?;

    let cli = processor::config::Cli::parse();
    if cli.session_id.is_some() && cli.demos.len() > 1 {
        anyhow::bail!("--session-id can only be used with a single demo");
    }

    tracing::info!("Starting...");

    let storage = processor::storage_from(&cli, tokio::runtime::Handle::current())?;
    if cli.clear_output {
        let to_clear = storage.duplicate();
        tokio::task::spawn_blocking(move || to_clear.clear()).await??;
        tracing::info!("Cleared previous exports");
    }

    let demo_count = cli.demos.len();
    let outcomes = processor::jobs::run_all(cli.demos.clone(), cli.job(), storage).await;

    let mut failed = demo_count - outcomes.len();
    for outcome in outcomes {
        match outcome.result {
            Ok(report) => {
                let line = serde_json::json!({
                    "demo": outcome.demo,
                    "result": report,
                });
                println!("{}", serde_json::to_string_pretty(&line)?);
            }
            Err(e) => {
                tracing::error!(demo = ?outcome.demo, "Processing failed: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} sessions failed", failed, demo_count);
    }

    Ok(())
}
