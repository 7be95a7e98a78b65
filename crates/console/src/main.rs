use std::sync::Arc;

use ledgerbus_console::{AppConfig, Harness};
use ledgerbus_consumer::{AnsiConsole, ConsoleSink, Severity};
use ledgerbus_events::{ApplicationExit, MessageService};

fn main() -> anyhow::Result<()> {
    ledgerbus_observability::init();

    let config = AppConfig::from_env();
    tracing::info!(
        company = %config.company_name,
        customer = %config.customer,
        policy = ?config.duplicate_policy,
        "starting"
    );

    let service = Arc::new(MessageService::with_policy(config.duplicate_policy));
    MessageService::install(service.clone())?;

    let exit = ApplicationExit::global();
    let _exit_guard = exit.guard();

    let console: Arc<dyn ConsoleSink> = Arc::new(AnsiConsole::new());
    let harness = Harness::new(config, service, console.clone());

    if let Err(err) = harness.run(exit) {
        console.write(Severity::Error, &format!("{err:#}"));
        return Err(err);
    }
    Ok(())
}
