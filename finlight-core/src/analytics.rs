//! Monthly analytics derived from the ledger document.
//!
//! Everything here is a pure function of the document; nothing is cached.
//! Values are kept unrounded, callers round with [`crate::money::round2`]
//! at display or export time.

use serde::Serialize;

use crate::model::{Expense, Income, LedgerDocument};
use crate::time::in_month;

/// Slice name used when the month has no categorised spending.
pub const NO_EXPENSES_LABEL: &str = "no expenses";

/// Colours assigned to chart slices in order, wrapping around.
pub const PALETTE: [&str; 12] = [
    "#c7d2fe", "#fde68a", "#a7f3d0", "#fbcfe8", "#bae6fd", "#fecaca", "#ddd6fe", "#bbf7d0",
    "#f5d0fe", "#fef3c7", "#d1fae5", "#fee2e2",
];

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Budget model as whole percentages of desired income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetSplit {
    pub needs: u8,
    pub invest: u8,
    pub fun: u8,
}

impl BudgetSplit {
    /// The fixed 80/10/10 model.
    pub const STANDARD: BudgetSplit = BudgetSplit {
        needs: 80,
        invest: 10,
        fun: 10,
    };

    fn share(pct: u8) -> f64 {
        f64::from(pct) / 100.0
    }
}

impl Default for BudgetSplit {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// One named, positive slice of the category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShortfallStatus {
    /// Income is below what current spending implies
    Shortfall,
    /// Income exceeds it
    Surplus,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DebtSummary {
    pub open_count: usize,
    pub open_total: f64,
    pub done_count: usize,
}

/// Totals and targets for the active month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAnalytics {
    pub month: String,
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub split: BudgetSplit,
    /// Income at which current spending would be exactly the needs share
    pub desired_income: f64,
    /// `desired_income - total_income`; negative means surplus
    pub shortfall: f64,
    pub required_extra: f64,
    pub needs_target: f64,
    pub invest_target: f64,
    pub fun_target: f64,
    pub categories: Vec<CategorySlice>,
    pub debts: DebtSummary,
}

pub fn expenses_in_month<'a>(doc: &'a LedgerDocument, month: &'a str) -> impl Iterator<Item = &'a Expense> {
    doc.expenses
        .iter()
        .filter(move |e| e.date.is_some_and(|d| in_month(d, month)))
}

pub fn incomes_in_month<'a>(doc: &'a LedgerDocument, month: &'a str) -> impl Iterator<Item = &'a Income> {
    doc.incomes
        .iter()
        .filter(move |i| i.date.is_some_and(|d| in_month(d, month)))
}

/// Per-category sums in taxonomy order, positive sums only. Falls back to a
/// single placeholder slice so a chart always has something to draw.
pub fn category_breakdown(doc: &LedgerDocument, month: &str) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = Vec::new();
    for name in &doc.categories {
        // duplicate taxonomy entries collapse into one slice
        if slices.iter().any(|s| &s.name == name) {
            continue;
        }
        let value: f64 = expenses_in_month(doc, month)
            .filter(|e| &e.category == name)
            .map(|e| e.amount)
            .sum();
        if value > 0.0 {
            slices.push(CategorySlice {
                name: name.clone(),
                value,
            });
        }
    }

    if slices.is_empty() {
        slices.push(CategorySlice {
            name: NO_EXPENSES_LABEL.to_string(),
            value: 1.0,
        });
    }
    slices
}

pub fn debt_summary(doc: &LedgerDocument) -> DebtSummary {
    doc.debts.iter().fold(DebtSummary::default(), |mut acc, d| {
        if d.done {
            acc.done_count += 1;
        } else {
            acc.open_count += 1;
            acc.open_total += d.amount;
        }
        acc
    })
}

impl MonthlyAnalytics {
    /// Analytics for `doc.active_month` under the standard 80/10/10 split.
    pub fn compute(doc: &LedgerDocument) -> Self {
        Self::compute_for(doc, &doc.active_month, BudgetSplit::STANDARD)
    }

    pub fn compute_for(doc: &LedgerDocument, month: &str, split: BudgetSplit) -> Self {
        let total_expense: f64 = expenses_in_month(doc, month).map(|e| e.amount).sum();
        let total_income: f64 = incomes_in_month(doc, month).map(|i| i.amount).sum();

        let desired_income = if split.needs > 0 {
            total_expense / BudgetSplit::share(split.needs)
        } else {
            0.0
        };
        let shortfall = desired_income - total_income;

        Self {
            month: month.to_string(),
            total_income,
            total_expense,
            balance: total_income - total_expense,
            split,
            desired_income,
            shortfall,
            required_extra: shortfall.max(0.0),
            needs_target: desired_income * BudgetSplit::share(split.needs),
            invest_target: desired_income * BudgetSplit::share(split.invest),
            fun_target: desired_income * BudgetSplit::share(split.fun),
            categories: category_breakdown(doc, month),
            debts: debt_summary(doc),
        }
    }

    pub fn shortfall_status(&self) -> ShortfallStatus {
        if self.shortfall > 0.0 {
            ShortfallStatus::Shortfall
        } else if self.shortfall < 0.0 {
            ShortfallStatus::Surplus
        } else {
            ShortfallStatus::Balanced
        }
    }

    /// True when the breakdown is only the placeholder slice.
    pub fn breakdown_is_placeholder(&self) -> bool {
        matches!(self.categories.as_slice(), [only] if only.name == NO_EXPENSES_LABEL && only.value == 1.0)
    }
}
