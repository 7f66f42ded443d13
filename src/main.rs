use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use bank_account::{
    is_amount_valid, is_email_valid, load_operations, replay, AccountRegistry, Money,
};

#[derive(Parser)]
#[command(name = "bank-account")]
#[command(about = "Validate account inputs and replay account operations", long_about = None)]
struct Cli {
    /// Log every applied and rejected operation to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an email address against the account identity rule
    CheckEmail { identity: String },

    /// Check that an amount is non-negative with at most two decimals
    CheckAmount {
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Check the text itself (digits, optional `.` and one or two digits)
        /// instead of the float tolerance rule
        #[arg(long)]
        exact: bool,
    },

    /// Apply a CSV of operations (op,account,amount,destination) to empty accounts
    Replay {
        path: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::CheckEmail { identity } => report_check(is_email_valid(&identity)),
        Commands::CheckAmount { amount, exact } => report_check(check_amount(&amount, exact)?),
        Commands::Replay { path, json } => run_replay(&path, json)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check_amount(text: &str, exact: bool) -> Result<bool> {
    if exact {
        return Ok(text.parse::<Money>().is_ok());
    }

    let amount: f64 = text
        .parse()
        .with_context(|| format!("Amount {:?} is not a number", text))?;
    Ok(is_amount_valid(amount))
}

fn report_check(valid: bool) {
    if valid {
        println!("valid");
    } else {
        println!("invalid");
        std::process::exit(1);
    }
}

fn run_replay(path: &Path, json: bool) -> Result<()> {
    let operations = load_operations(path)?;

    let mut registry = AccountRegistry::new();
    let report = replay(&mut registry, &operations);

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
        return Ok(());
    }

    println!("{}", report.summary());

    for outcome in report.rejections() {
        println!(
            "  row {:>4} {:<8} {}: {}",
            outcome.row,
            outcome.op.as_str(),
            outcome.account,
            outcome.message.as_deref().unwrap_or_default()
        );
    }

    println!();
    for (identity, balance) in &report.balances {
        println!("  {:<32} {:>12}", identity, balance.to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_amount_float_rule() {
        assert!(check_amount("10.50", false).unwrap());
        assert!(check_amount("1e2", false).unwrap());
        assert!(!check_amount("-50", false).unwrap());
        assert!(!check_amount("10.999", false).unwrap());
        assert!(check_amount("ten", false).is_err());
    }

    #[test]
    fn test_check_amount_exact_text() {
        assert!(check_amount("10.50", true).unwrap());
        assert!(check_amount("7", true).unwrap());
        assert!(!check_amount("1e2", true).unwrap());
        assert!(!check_amount("-50", true).unwrap());
        assert!(!check_amount("10.999", true).unwrap());
        assert!(!check_amount("ten", true).unwrap());
    }
}
