use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::{LevelFilter, info, warn};
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use tokio::task::{JoinError, JoinHandle};

mod cli;

use cli::{Cli, Commands, OutputFormat, TargetArgs};
use viewsweep::config::Config;
use viewsweep::connections::ConnectionRegistry;
use viewsweep::report::ReportDocument;
use viewsweep::sweep::{self, CancelToken, EngineStatus, SweepOutcome};

/// Exit code after a second interrupt, as a shell reports SIGINT.
const FORCE_QUIT_EXIT_CODE: i32 = 130;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("viewsweep")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("viewsweep.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Without RUST_LOG the logger accepts everything and the max level gates it,
    // so the configured level can be applied once the config is loaded
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .target(env_logger::Target::Pipe(target))
        .init();
    if rust_log_unset() {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn rust_log_unset() -> bool {
    std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_none()
}

/// RUST_LOG wins over the configured level.
fn apply_log_level(config: &Config) {
    if rust_log_unset() {
        let level = config.log_level_filter();
        log::set_max_level(level);
        info!("Log level set to {}", level);
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Scan { target } => handle_sweep_command(target, false, cli.is_verbose(), config).await,
        Commands::Drop { target } => handle_sweep_command(target, true, cli.is_verbose(), config).await,
        Commands::Connections => handle_connections_command(config),
    }
}

async fn handle_sweep_command(target: &TargetArgs, perform_deletion: bool, verbose: bool, config: &Config) -> Result<()> {
    let options = target.to_options(perform_deletion);
    info!("Handling sweep: {:?}", options);

    if perform_deletion {
        println!("{} {}", "Dropping leftover views on:".cyan(), options.connection_name);
    } else {
        println!("{} {}", "Scanning leftover views on:".cyan(), options.connection_name);
    }

    let registry = ConnectionRegistry::new(config);
    let cancel = CancelToken::new();

    // The sweep is blocking; run it off the async runtime so Ctrl-C stays responsive
    let task = {
        let options = options.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || sweep::run_sweep(&registry, &options, &cancel))
    };

    let joined = match wait_for_sweep(task, &cancel, tokio::signal::ctrl_c).await {
        SweepWait::Finished(joined) => joined,
        SweepWait::ForceQuit => {
            warn!("Second interrupt received, exiting without waiting for the current pass");
            eprintln!("{}", "Interrupted again, exiting".red());
            std::process::exit(FORCE_QUIT_EXIT_CODE);
        }
    };

    let outcome = joined
        .context("Sweep task panicked")?
        .with_context(|| format!("Sweep of connection '{}' failed", options.connection_name))?;

    emit_report(target, perform_deletion, &outcome)?;
    print_summary(&outcome, verbose);

    match outcome.status() {
        None | Some(EngineStatus::AllRemoved) => Ok(()),
        Some(EngineStatus::Cancelled) => Err(eyre!("Sweep cancelled before all views were dropped")),
        Some(status) => Err(eyre!(
            "Unable to drop all views: {}",
            status.last_error().unwrap_or("unknown error")
        )),
    }
}

enum SweepWait<T> {
    Finished(std::result::Result<T, JoinError>),
    ForceQuit,
}

/// Wait for the sweep task while watching for interrupts.
///
/// The first interrupt cancels the sweep, which then stops after its current
/// pass. A second one gives up on the task.
async fn wait_for_sweep<T, F, I>(mut task: JoinHandle<T>, cancel: &CancelToken, mut interrupt: F) -> SweepWait<T>
where
    F: FnMut() -> I,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        biased;
        joined = &mut task => return SweepWait::Finished(joined),
        _ = interrupt() => {
            warn!("Interrupt received, stopping after the current pass");
            println!("{}", "Interrupted, finishing the current pass (Ctrl-C again to quit)...".yellow());
            cancel.cancel();
        }
    }

    tokio::select! {
        biased;
        joined = &mut task => SweepWait::Finished(joined),
        _ = interrupt() => SweepWait::ForceQuit,
    }
}

fn emit_report(target: &TargetArgs, perform_deletion: bool, outcome: &SweepOutcome) -> Result<()> {
    let rendered = match target.format {
        OutputFormat::Text => format!("{}\n\n{}", outcome.table.title().bold(), outcome.table.render_text()),
        OutputFormat::Json => {
            let document = ReportDocument {
                generated_at: chrono::Utc::now(),
                connection: &target.connection,
                schema: target.schema.as_deref(),
                perform_deletion,
                status: outcome.status(),
                passes: outcome.engine.as_ref().map(|r| r.passes),
                table: &outcome.table,
            };
            document.to_json().context("Failed to serialize report")?
        }
    };

    match &target.output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("{} {}", "Report written to:".green(), path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn print_summary(outcome: &SweepOutcome, verbose: bool) {
    match &outcome.engine {
        None => println!("{} {} leftover view(s) found", "Scan:".green(), outcome.discovered),
        Some(result) => {
            let line = format!(
                "{} of {} view(s) dropped in {} pass(es)",
                result.removed_count(),
                outcome.discovered,
                result.passes
            );
            if result.status.is_success() {
                println!("{} {}", "Done:".green(), line);
            } else {
                println!("{} {} ({})", "Incomplete:".red(), line, result.status.as_str());
            }
            if verbose {
                for failed in result.outcomes.iter().filter(|o| !o.succeeded) {
                    println!(
                        "  {} {}: {}",
                        "x".red(),
                        failed.object,
                        failed.error_detail.as_deref().unwrap_or_default()
                    );
                }
            }
        }
    }
}

fn handle_connections_command(config: &Config) -> Result<()> {
    let registry = ConnectionRegistry::new(config);
    let mut count = 0;
    for (name, connection) in registry.iter() {
        let marker = if connection.is_sql() { name.green() } else { name.dimmed() };
        println!("{:<24} {}", marker, connection.kind());
        count += 1;
    }
    if count == 0 {
        println!("{}", "No connections configured".yellow());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&config);

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_without_interrupt_returns_result() {
        let cancel = CancelToken::new();
        let task = tokio::task::spawn_blocking(|| 7);

        let waited = wait_for_sweep(task, &cancel, std::future::pending::<std::io::Result<()>>).await;

        assert!(matches!(waited, SweepWait::Finished(Ok(7))));
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_first_interrupt_cancels_and_waits() {
        let cancel = CancelToken::new();
        let observed = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            while !observed.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            "stopped"
        });

        let calls = Arc::new(AtomicUsize::new(0));
        let interrupt = {
            let calls = calls.clone();
            move || {
                let first = calls.fetch_add(1, Ordering::SeqCst) == 0;
                async move {
                    if first {
                        Ok(())
                    } else {
                        std::future::pending().await
                    }
                }
            }
        };

        let waited = wait_for_sweep(task, &cancel, interrupt).await;

        assert!(matches!(waited, SweepWait::Finished(Ok("stopped"))));
        assert!(cancel.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_interrupt_forces_quit() {
        let cancel = CancelToken::new();
        // Ignores cancellation, like a pass stuck on a busy database
        let task = tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_millis(200)));

        let waited = wait_for_sweep(task, &cancel, || async { Ok(()) }).await;

        assert!(matches!(waited, SweepWait::ForceQuit));
        assert!(cancel.is_cancelled());
    }
}
