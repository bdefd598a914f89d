use anyhow::Context;
use clap::Parser;
use feed_etl::config::toml_config::TomlConfig;
use feed_etl::sources::FeedSource;
use feed_etl::utils::{logger, validation::Validate};
use feed_etl::{app, ConfigProvider};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Feed import driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "feed-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override continue_on_error from config
    #[arg(long)]
    continue_on_error: Option<bool>,

    /// Show what would be imported without opening any feed or store
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    logger::init_logger(args.verbose, config.json_logs());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(monitor) = args.monitor {
        let monitoring = config
            .monitoring
            .get_or_insert(feed_etl::config::toml_config::MonitoringConfig {
                enabled: monitor,
                log_format: None,
            });
        monitoring.enabled = monitor;
    }
    if let Some(continue_on_error) = args.continue_on_error {
        config.error_handling = Some(feed_etl::config::toml_config::ErrorHandlingConfig {
            continue_on_error: Some(continue_on_error),
        });
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        perform_dry_run(&config)?;
        return Ok(());
    }

    match app::run(&config).await {
        Ok(report) if report.is_success() => {
            for summary in &report.summaries {
                println!("✅ {}", summary);
            }
            println!("All done!");
        }
        Ok(report) => {
            for summary in &report.summaries {
                println!("✅ {}", summary);
            }
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
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name,
        config.pipeline.version.as_deref().unwrap_or("0")
    );
    println!("  Feeds: {}", config.feeds.len());
    println!("  Store: {}", config.store_settings().describe());
    println!("  Batch size: {}", config.batch_size());
    println!("  Continue on error: {}", config.continue_on_error());
    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    for (index, job) in config.feeds.iter().enumerate() {
        let source = FeedSource::parse(&job.source)?;
        let parser = job.parser()?;
        println!();
        println!("  [{}] {} feed", index + 1, job.format);
        println!(
            "      Source: {} ({})",
            source,
            if source.is_remote() { "download" } else { "local" }
        );
        if let Some(tag) = &job.record_tag {
            println!("      Record tag: {}", tag);
        }
        for field in feed_etl::domain::model::ModelField::ALL {
            match parser.mapping().column_for(field) {
                Some(column) => println!("      {} <- {}", field, column),
                None => println!("      {} (not in feed)", field),
            }
        }
    }
    if config.feeds.iter().any(|job| job.source.contains("://")) {
        println!();
        println!("  Remote feeds are cached in {}", config.cache_dir().display());
    }
    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
