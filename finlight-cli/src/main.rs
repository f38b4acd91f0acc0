use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use finlight_export::write_month_csv;

mod config;
mod ledger_cmd;
mod offline_cmd;
mod report;
mod state;

use ledger_cmd::{CategoryCommand, DebtCommand, ExpenseCommand, IncomeCommand, MonthCommand};
use offline_cmd::OfflineCommand;

#[derive(Parser, Debug)]
#[command(
    name = "finlight",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FINLIGHT_BUILD_SHA"), ")"),
    about = "Monthly income/expense tracker with an 80/10/10 budget view"
)]
struct Cli {
    /// Data directory (default: $FINLIGHT_HOME or ~/.finlight)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config.toml into the data directory
    Init,

    /// Show or change the active month
    Month {
        #[command(subcommand)]
        command: MonthCommand,
    },

    /// Record, edit and list expenses
    Expense {
        #[command(subcommand)]
        command: ExpenseCommand,
    },

    /// Record, edit and list incomes
    Income {
        #[command(subcommand)]
        command: IncomeCommand,
    },

    /// Track debts
    Debt {
        #[command(subcommand)]
        command: DebtCommand,
    },

    /// Manage the expense category list
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Analysis of the active month: totals, 80/10/10 split, breakdown, debts
    Report {
        /// Print the analytics as JSON instead
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Export the active month as finances_<YYYY-MM>.csv
    Export {
        /// Target directory (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Offline cache worker for the hosted app
    Offline {
        #[command(subcommand)]
        command: OfflineCommand,
    },
}

/// Log level used when `RUST_LOG` is unset.
fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let home = state::finlight_home(cli.home.as_deref())?;
    let cfg = config::load_config(&home)?;
    tracing::debug!(home = %home.display(), "using data directory");

    match cli.command {
        Command::Init => config::init_config(&home)?,
        Command::Month { command } => ledger_cmd::run_month(&home, &cfg, command)?,
        Command::Expense { command } => ledger_cmd::run_expense(&home, &cfg, command)?,
        Command::Income { command } => ledger_cmd::run_income(&home, &cfg, command)?,
        Command::Debt { command } => ledger_cmd::run_debt(&home, &cfg, command)?,
        Command::Category { command } => ledger_cmd::run_category(&home, &cfg, command)?,

        Command::Report { json } => {
            let ledger = state::open_ledger(&home, &cfg)?;
            let analytics = ledger.analytics();
            if json {
                println!("{}", serde_json::to_string_pretty(&analytics)?);
            } else {
                print!(
                    "{}",
                    report::render_report(ledger.document(), &analytics, &cfg.ledger.currency)
                );
            }
        }

        Command::Export { out } => {
            let dir = match out {
                Some(dir) => dir,
                None => std::env::current_dir().context("current directory")?,
            };
            if !dir.is_dir() {
                bail!("export directory not found: {}", dir.display());
            }
            let ledger = state::open_ledger(&home, &cfg)?;
            let path = write_month_csv(&dir, ledger.document())
                .with_context(|| format!("exporting to {}", dir.display()))?;
            println!("Wrote {}", path.display());
        }

        Command::Offline { command } => offline_cmd::run(&home, &cfg, command).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_level(0), "warn");
        let cli = Cli::try_parse_from(["finlight", "-v", "report"]).unwrap();
        assert_eq!(default_level(cli.verbose), "info");
        let cli = Cli::try_parse_from(["finlight", "-vv", "report"]).unwrap();
        assert_eq!(default_level(cli.verbose), "debug");
        assert_eq!(default_level(5), "debug");
    }

    #[test]
    fn test_offline_subcommands() {
        let cli = Cli::try_parse_from(["finlight", "offline", "install"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Offline {
                command: OfflineCommand::Install
            }
        ));
        assert!(Cli::try_parse_from(["finlight", "offline", "activate"]).is_err());
    }
}
