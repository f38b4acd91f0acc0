use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Subcommand;
use std::path::Path;

use finlight_core::{
    ExpensePatch, IncomePatch, KvStore, Ledger, expenses_in_month, format_date_human,
    format_money, incomes_in_month, parse_month, today,
};

use crate::config::Config;
use crate::state::open_ledger;

#[derive(Subcommand, Debug)]
pub enum MonthCommand {
    /// Print the active month
    Show,
    /// Switch the active month (YYYY-MM)
    Set { month: String },
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// Quick-add an expense
    Add {
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        /// Defaults to the first category of the taxonomy
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        note: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change fields of an existing expense
    Edit {
        id: i64,
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        /// Pass an empty string to clear the note
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete { id: i64 },
    /// Expenses of the active month
    List,
}

#[derive(Subcommand, Debug)]
pub enum IncomeCommand {
    /// Quick-add an income
    Add {
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Edit {
        id: i64,
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete { id: i64 },
    /// Incomes of the active month
    List,
}

#[derive(Subcommand, Debug)]
pub enum DebtCommand {
    Add {
        name: String,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Flip a debt between open and done
    Toggle { id: i64 },
    Delete { id: i64 },
    List,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    List,
    Add { name: String },
    /// Remove from the taxonomy; existing expenses keep the name
    Remove { name: String },
}

fn report_change(changed: bool, what: &str, id: i64) {
    if changed {
        println!("{what} {id}");
    } else {
        println!("No record with id {id}");
    }
}

fn check_amount(amount: Option<f64>) -> Result<()> {
    match amount {
        Some(a) if !a.is_finite() => bail!("amount must be a finite number, got {a}"),
        _ => Ok(()),
    }
}

fn report_added(id: Option<i64>, what: &str, rule: &str) {
    match id {
        Some(id) => println!("Added {what} {id}"),
        None => println!("Nothing added: {rule}"),
    }
}

pub fn run_month(home: &Path, cfg: &Config, cmd: MonthCommand) -> Result<()> {
    let mut ledger = open_ledger(home, cfg)?;
    match cmd {
        MonthCommand::Show => println!("{}", ledger.active_month()),
        MonthCommand::Set { month } => {
            if parse_month(&month).is_none() {
                bail!("invalid month {month:?}; expected YYYY-MM");
            }
            ledger.set_active_month(month);
            println!("Active month: {}", ledger.active_month());
        }
    }
    ledger.close();
    Ok(())
}

pub fn run_expense(home: &Path, cfg: &Config, cmd: ExpenseCommand) -> Result<()> {
    let mut ledger = open_ledger(home, cfg)?;
    match cmd {
        ExpenseCommand::Add {
            amount,
            category,
            note,
            date,
        } => {
            let category =
                category.unwrap_or_else(|| ledger.document().default_category().to_string());
            if !ledger.document().has_category(&category) {
                println!("Note: {category:?} is not in the category list; it won't show in the breakdown");
            }
            let id = ledger.add_expense(date.unwrap_or_else(today), category, &note, amount);
            report_added(id, "expense", "amount must be non-zero");
        }
        ExpenseCommand::Edit {
            id,
            amount,
            category,
            note,
            date,
        } => {
            check_amount(amount)?;
            let patch = ExpensePatch {
                date,
                category,
                note,
                amount,
            };
            report_change(ledger.edit_expense(id, patch), "Updated expense", id);
        }
        ExpenseCommand::Delete { id } => {
            report_change(ledger.delete_expense(id), "Deleted expense", id);
        }
        ExpenseCommand::List => print_expenses(&ledger, &cfg.ledger.currency),
    }
    ledger.close();
    Ok(())
}

pub fn run_income(home: &Path, cfg: &Config, cmd: IncomeCommand) -> Result<()> {
    let mut ledger = open_ledger(home, cfg)?;
    match cmd {
        IncomeCommand::Add {
            amount,
            label,
            date,
        } => {
            let id = ledger.add_income(date.unwrap_or_else(today), &label, amount);
            report_added(id, "income", "amount must be non-zero");
        }
        IncomeCommand::Edit {
            id,
            amount,
            label,
            date,
        } => {
            check_amount(amount)?;
            let patch = IncomePatch {
                date,
                label,
                amount,
            };
            report_change(ledger.edit_income(id, patch), "Updated income", id);
        }
        IncomeCommand::Delete { id } => {
            report_change(ledger.delete_income(id), "Deleted income", id);
        }
        IncomeCommand::List => print_incomes(&ledger, &cfg.ledger.currency),
    }
    ledger.close();
    Ok(())
}

pub fn run_debt(home: &Path, cfg: &Config, cmd: DebtCommand) -> Result<()> {
    let mut ledger = open_ledger(home, cfg)?;
    match cmd {
        DebtCommand::Add { name, amount } => {
            let id = ledger.add_debt(&name, amount);
            report_added(id, "debt", "name must not be blank and amount must be non-zero");
        }
        DebtCommand::Toggle { id } => {
            report_change(ledger.toggle_debt_done(id), "Toggled debt", id);
        }
        DebtCommand::Delete { id } => {
            report_change(ledger.delete_debt(id), "Deleted debt", id);
        }
        DebtCommand::List => {
            let currency = &cfg.ledger.currency;
            for d in &ledger.document().debts {
                let mark = if d.done { "x" } else { " " };
                println!("[{mark}] {:>15}  {}  {}", d.id, format_money(d.amount, currency), d.name);
            }
        }
    }
    ledger.close();
    Ok(())
}

pub fn run_category(home: &Path, cfg: &Config, cmd: CategoryCommand) -> Result<()> {
    let mut ledger = open_ledger(home, cfg)?;
    match cmd {
        CategoryCommand::List => {
            for c in &ledger.document().categories {
                println!("{c}");
            }
        }
        CategoryCommand::Add { name } => {
            if ledger.add_category(&name) {
                println!("Added category {:?}", name.trim());
            } else {
                println!("Nothing added: blank or existing category");
            }
        }
        CategoryCommand::Remove { name } => {
            if ledger.remove_category(&name) {
                println!("Removed category {name:?}");
            } else {
                println!("No category named {name:?}");
            }
        }
    }
    ledger.close();
    Ok(())
}

fn print_expenses<S: KvStore>(ledger: &Ledger<S>, currency: &str) {
    let doc = ledger.document();
    for e in expenses_in_month(doc, &doc.active_month) {
        println!(
            "{:>15}  {}  {:<18} {:>12}  {}",
            e.id,
            e.date.map(format_date_human).unwrap_or_default(),
            e.category,
            format_money(e.amount, currency),
            e.note.as_deref().unwrap_or("")
        );
    }
}

fn print_incomes<S: KvStore>(ledger: &Ledger<S>, currency: &str) {
    let doc = ledger.document();
    for i in incomes_in_month(doc, &doc.active_month) {
        println!(
            "{:>15}  {}  {:<24} {:>12}",
            i.id,
            i.date.map(format_date_human).unwrap_or_default(),
            i.label,
            format_money(i.amount, currency)
        );
    }
}
