use crate::reports;
use clap::Args;
use scoreforge::error::CliResult;
use scoreforge_core::{validate_vertical, Severity, VerticalConfig};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Treat warnings as failures.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

/// Returns `Ok(false)` when the vertical has blocking issues.
pub fn run(args: &ValidateArgs, vertical: &VerticalConfig) -> CliResult<bool> {
    let issues = validate_vertical(vertical);

    println!("\n=== VERTICAL AUDIT: {} ===", vertical.id);
    if issues.is_empty() {
        println!("No issue found.");
        return Ok(true);
    }
    reports::print_issues(&issues);

    let threshold = if args.strict {
        Severity::Warning
    } else {
        Severity::Error
    };
    Ok(issues.iter().all(|i| i.severity < threshold))
}
