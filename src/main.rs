use clap::Parser;
use kimsufi_order::config::env_lookup;
use kimsufi_order::utils::error::ErrorSeverity;
use kimsufi_order::utils::logger::{self, LogFormat};
use kimsufi_order::{
    CliConfig, ConsolePrompt, OrderError, OrderOrchestrator, OrderOutcome, OvhClient,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if let Err(e) = logger::init_logger(LogFormat::from_json_flag(cli.json_logs), cli.verbose) {
        eprintln!("⚠️  {}", e);
    }

    tracing::info!("Starting kimsufi-order");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(&cli).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ Order failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(exit_code(e.severity()))
        }
    }
}

/// Every error reaching `main` ends the run, so none maps to 0.
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}

/// Runs one order and returns the process exit code.
async fn run(cli: &CliConfig) -> Result<i32, OrderError> {
    let file = cli.load_file()?;
    let settings = cli.resolve(&file, env_lookup)?;
    tracing::debug!("Run settings: {:?}", settings);

    let client = OvhClient::new(&settings.base_url, settings.request_timeout)?;
    let mut orchestrator = OrderOrchestrator::new(client, ConsolePrompt::stdio());

    let outcome = orchestrator
        .run_with_deadline(&settings.request, settings.deadline)
        .await?;

    match outcome {
        OrderOutcome::Completed(order) => {
            tracing::info!(
                "✅ Order {} placed after {} attempt(s): {} in {}",
                order.checkout.order_id,
                order.attempts,
                order.combination,
                order.datacenter
            );
            if let Some(total) = &order.checkout.total {
                println!("💶 Total: {}", total);
            }
            println!("✅ Order {} placed in {}", order.checkout.order_id, order.datacenter);
            println!("🔗 {}", order.checkout.url);
            Ok(0)
        }
        OrderOutcome::Exhausted { attempts } => {
            println!("⏳ Nothing available after {} attempt(s)", attempts);
            Ok(if settings.fail_when_unavailable { 2 } else { 0 })
        }
        OrderOutcome::DryRun {
            combinations,
            datacenters,
        } => {
            println!(
                "🔍 Dry run: {} combination(s) x {} datacenter(s) ({})",
                combinations,
                datacenters.len(),
                datacenters.join(", ")
            );
            Ok(0)
        }
    }
}
