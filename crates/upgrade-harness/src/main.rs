//! upgrade-harness binary

use anyhow::{Context, Result};
use upgrade_harness::cli::{self, Action};
use upgrade_harness::{logging, prepare, HarnessConfig};
use upgrade_proposal::HookBook;

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = match cli::parse_from(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) => e.exit(),
    };

    let mut config = HarnessConfig::load(&invocation.config)
        .await
        .with_context(|| format!("loading {}", invocation.config.display()))?;
    invocation.apply(&mut config);

    logging::init(config.logging, invocation.json_logs)
        .context("installing tracing subscriber")?;

    let prepared = prepare(&config, &HookBook::new()).await?;

    match invocation.action {
        Action::Check => {
            let issues = prepared.check();
            println!("=== Dependency Check ===");
            for issue in &issues {
                println!("  {issue}");
            }
            println!(
                "{} proposal(s), {} issue(s)",
                prepared.catalogue().len(),
                issues.len()
            );
            std::process::exit(i32::from(!issues.is_empty()));
        }
        Action::Run => {
            let report = prepared.run().await?;
            if invocation.json {
                let summary = serde_json::to_string_pretty(&report.summary())
                    .context("serializing run summary")?;
                println!("{summary}");
            } else {
                print!("{}", report.render_text());
            }
            std::process::exit(i32::from(!report.is_safe_to_ship()));
        }
    }
}
