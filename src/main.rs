use bdr_fetch::utils::{logger, validation::Validate};
use bdr_fetch::{CliConfig, FetchEngine, FetchError, FetchSettings, ImagePipeline, LocalStorage};
use clap::Parser;

fn report_and_exit(e: &FetchError) -> ! {
    tracing::error!(
        "❌ Fetch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("Error: {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

async fn run(config: &CliConfig) -> bdr_fetch::Result<()> {
    let settings = FetchSettings::resolve(config)?;
    settings.validate()?;
    tracing::debug!("Resolved settings: {:?}", settings);

    let storage = LocalStorage::new(settings.output.clone());
    let pipeline = ImagePipeline::new(storage, settings)?;
    let engine = FetchEngine::new_with_monitoring(pipeline, config.monitor);

    let summary = engine.run().await?;

    if summary.planned() > 0 {
        println!(
            "🔎 {} images would be written to {}",
            summary.planned(),
            summary.output_dir.display()
        );
    } else {
        println!(
            "✅ {} downloaded, {} skipped, {} failed → {}",
            summary.downloaded(),
            summary.skipped(),
            summary.failed(),
            summary.output_dir.display()
        );
    }

    if summary.failed() > 0 {
        return Err(FetchError::PartialFailure {
            failed: summary.failed(),
            total: summary.total(),
        });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    if config.pid.trim().is_empty() {
        eprintln!("Error: PID cannot be empty.");
        std::process::exit(1);
    }

    if let Err(e) = run(&config).await {
        report_and_exit(&e);
    }

    Ok(())
}
