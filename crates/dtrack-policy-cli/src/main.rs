mod cli;
mod config;
mod observability;
mod output;

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use dtrack_policy_client::DtrackClient;
use dtrack_policy_core::{
    ApplyReport, DesiredState, DryRunAccessor, PolicyAccessor, Synchronizer, TracingAuditSink,
    parse_conditions,
};
use tracing::info;

use cli::Cli;
use config::AppConfig;
use output::{print_error, print_report};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);
    let config = AppConfig::from_cli(&cli)?;
    let (policy_name, dry_run) = (config.policy_name.clone(), config.dry_run);

    let report = apply(config, std::io::stdin().lock()).await?;
    print_report(&policy_name, &report, dry_run);
    Ok(())
}

/// Reads the condition document from `input` and converges the policy.
/// Nothing is sent to the server until the document has parsed.
async fn apply(config: AppConfig, mut input: impl Read) -> Result<ApplyReport> {
    let mut document = Vec::new();
    input
        .read_to_end(&mut document)
        .context("failed to read policy conditions from stdin")?;
    let conditions = parse_conditions(&document)?;

    let client = DtrackClient::new(&config.base_url, &config.api_key, config.timeout)?;
    let dry_run = config.dry_run;
    let remote: Box<dyn PolicyAccessor> = if dry_run {
        info!("dry run: no changes will be written");
        Box::new(DryRunAccessor::new(client))
    } else {
        Box::new(client)
    };
    let audit = TracingAuditSink::new().dry_run(dry_run);

    let input = config.into_input(conditions);
    let desired = DesiredState::build(remote.as_ref(), &input, &audit)
        .await
        .context("failed to resolve desired policy state")?;
    let report = Synchronizer::new(remote.as_ref(), &audit)
        .apply(&desired)
        .await
        .with_context(|| format!("failed to apply policy {:?}", input.policy_name))?;
    Ok(report)
}
