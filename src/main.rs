use clap::{Args, Parser, Subcommand};
use dashboard::config::{ConfigLoader, DashboardConfig};
use dashboard::controller::RefreshController;
use dashboard::output;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(version)]
#[command(about = "Polling market dashboard for the /api/refresh backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Path to the configuration file (JSON/YAML/TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:5000
    #[arg(short, long)]
    base_url: Option<String>,

    /// Auto-refresh interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh now, then keep refreshing on a timer. Enter refreshes, q quits.
    Run {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Print status changes as plain lines instead of a live spinner
        #[arg(long)]
        no_progress: bool,
    },
    /// Run a single refresh cycle and print the result
    Once {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Query the backend health endpoint
    Health {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn resolve_config(args: &ConnectionArgs) -> anyhow::Result<DashboardConfig> {
    if let Some(path) = &args.config {
        log::info!("Loading config from {:?}", path);
    }
    let mut config = ConfigLoader::load_or_default(args.config.as_deref())?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(interval) = args.interval {
        config.refresh_interval_secs = interval;
    }
    ConfigLoader::validate(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let level = logger.filter();
    let multi = Arc::new(indicatif::MultiProgress::new());

    match &cli.command {
        Commands::Run { no_progress: false, .. } => {
            indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
        }
        _ => log::set_boxed_logger(Box::new(logger))?,
    }
    log::set_max_level(level);

    match cli.command {
        Commands::Run { connection, no_progress } => {
            let config = resolve_config(&connection)?;
            let mut controller = RefreshController::from_config(&config)?;
            let mut handler = ConfigLoader::create_output(&config, (!no_progress).then(|| multi.clone()));

            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let views = controller.watch_view();
            let presenter = tokio::spawn(async move {
                output::drive(views, handler.as_mut(), async {
                    let _ = shutdown_rx.await;
                })
                .await
            });

            log::info!(
                "Dashboard polling {} every {}s",
                config.base_url,
                controller.interval().as_secs()
            );
            controller.trigger();
            controller.start_auto_refresh();

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdin_open = true;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        log::info!("Shutting down...");
                        break;
                    }
                    line = lines.next_line(), if stdin_open => match line {
                        Ok(Some(line)) => match line.trim() {
                            "q" | "quit" => break,
                            "" | "r" | "refresh" => {
                                controller.trigger();
                            }
                            other => log::warn!("Unknown command {:?} (Enter/r refreshes, q quits)", other),
                        },
                        Ok(None) => stdin_open = false,
                        Err(e) => {
                            log::warn!("Stopped reading stdin: {}", e);
                            stdin_open = false;
                        }
                    },
                }
            }

            controller.stop_auto_refresh();
            let _ = shutdown_tx.send(());
            presenter.await??;

            let metrics = controller.metrics();
            println!("\n✅ Dashboard stopped:");
            println!("   Refreshes: {}", metrics.refreshes_total);
            println!("   Success Rate: {:.1}%", metrics.success_rate);
            println!("   Server Errors: {}", metrics.server_errors);
            println!("   Connection Errors: {}", metrics.connection_errors);
            println!("   Average Duration: {}ms", metrics.avg_response_time_ms);
            println!("   Total Time: {:.1}s", metrics.elapsed_seconds);
        }
        Commands::Once { connection } => {
            let config = resolve_config(&connection)?;
            let controller = RefreshController::from_config(&config)?;

            let outcome = controller.refresh().await;
            controller.settle().await;

            let view = controller.view();
            let mut handler = ConfigLoader::create_output(&config, None);
            handler.write(&view).await?;
            handler.close().await?;

            if outcome.is_failure() {
                eprintln!("❌ {}", view.status.message);
                std::process::exit(1);
            }
        }
        Commands::Health { connection } => {
            let config = resolve_config(&connection)?;
            let controller = RefreshController::from_config(&config)?;
            match controller.health().await {
                Ok(report) => {
                    println!("✅ Backend status: {}", report.status);
                    if let Some(ts) = report.timestamp {
                        println!("   Timestamp: {}", ts.to_rfc3339());
                    }
                    println!("   Has Data: {}", report.cache.has_data);
                    println!(
                        "   Last Update: {}",
                        report.cache.last_update.as_deref().unwrap_or("never")
                    );
                    println!("   Updates: {}", report.cache.update_count);
                    println!("   Errors: {}", report.cache.error_count);
                }
                Err(e) => {
                    eprintln!("❌ Health check failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { config } => match ConfigLoader::load(&config) {
            Ok(cfg) => {
                println!("✅ Config is valid:");
                println!("   Base URL: {}", cfg.base_url);
                println!("   Refresh Interval: {}s", cfg.refresh_interval_secs);
                println!("   Output: {:?}", cfg.output);
            }
            Err(e) => {
                eprintln!("❌ Config error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
