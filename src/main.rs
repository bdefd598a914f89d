use clap::Parser;
use feed_etl::utils::{logger, validation::Validate};
use feed_etl::{app, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting feed-etl");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match app::run(&config).await {
        Ok(report) if report.is_success() => {
            println!("All done!");
        }
        Ok(report) => {
            for failure in &report.failures {
                eprintln!("❌ {}: {}", failure.job, failure.error.user_friendly_message());
            }
            let exit_code = report
                .failures
                .iter()
                .map(|f| f.error.exit_code())
                .max()
                .unwrap_or(1);
            std::process::exit(exit_code);
        }
        Err(e) => {
            tracing::error!(
                "❌ Feed import failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
