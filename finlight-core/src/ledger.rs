//! Ledger: the owned, persisted document and every user-facing mutation.
//!
//! Each operation applies fully to the in-memory document and then writes the
//! whole document back through the [`PersistenceStore`]. Invalid input and
//! unknown ids are silent no-ops; a failed write never rolls anything back.

use chrono::NaiveDate;
use tracing::debug;

use crate::analytics::MonthlyAnalytics;
use crate::ids::{Clock, IdGenerator, SystemClock};
use crate::model::{
    DEFAULT_INCOME_LABEL, Debt, Expense, ExpensePatch, Income, IncomePatch, LedgerDocument,
    normalize_note,
};
use crate::store::{KvStore, PersistenceStore};

pub struct Ledger<S, C: Clock = SystemClock> {
    doc: LedgerDocument,
    store: PersistenceStore<S>,
    ids: IdGenerator<C>,
    /// Set while the last write failed and memory is ahead of the store
    unsaved: bool,
}

/// Zero, NaN and infinities are rejected by the add operations.
fn usable_amount(amount: f64) -> bool {
    amount != 0.0 && amount.is_finite()
}

impl<S: KvStore> Ledger<S> {
    /// Load the stored document (or seed a fresh one).
    pub fn open(store: PersistenceStore<S>) -> Self {
        Self::open_with_clock(store, SystemClock)
    }
}

impl<S: KvStore, C: Clock> Ledger<S, C> {
    pub fn open_with_clock(store: PersistenceStore<S>, clock: C) -> Self {
        let doc = store.load();
        let ids = IdGenerator::with_clock(clock).seeded(doc.max_id());
        debug!(
            month = %doc.active_month,
            incomes = doc.incomes.len(),
            expenses = doc.expenses.len(),
            debts = doc.debts.len(),
            "ledger opened"
        );
        Self {
            doc,
            store,
            ids,
            unsaved: false,
        }
    }

    pub fn document(&self) -> &LedgerDocument {
        &self.doc
    }

    pub fn store(&self) -> &PersistenceStore<S> {
        &self.store
    }

    pub fn active_month(&self) -> &str {
        &self.doc.active_month
    }

    /// Analytics for the active month, computed from the current snapshot.
    pub fn analytics(&self) -> MonthlyAnalytics {
        MonthlyAnalytics::compute(&self.doc)
    }

    /// True when a mutation has not reached the store yet.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Write the current document unconditionally.
    pub fn flush(&mut self) {
        self.unsaved = !self.store.save(&self.doc);
    }

    /// Hand back the persistence store, retrying a failed write first.
    /// A ledger that was only read leaves the store untouched.
    pub fn close(mut self) -> PersistenceStore<S> {
        if self.unsaved {
            self.flush();
        }
        self.store
    }

    fn commit(&mut self) {
        self.flush();
    }

    pub fn set_active_month(&mut self, month: impl Into<String>) {
        self.doc.active_month = month.into();
        self.commit();
    }

    pub fn add_expense(
        &mut self,
        date: NaiveDate,
        category: impl Into<String>,
        note: &str,
        amount: f64,
    ) -> Option<i64> {
        if !usable_amount(amount) {
            debug!(amount, "expense rejected: zero or non-numeric amount");
            return None;
        }
        let id = self.ids.next_id();
        self.doc.expenses.insert(
            0,
            Expense {
                id,
                date: Some(date),
                category: category.into(),
                note: normalize_note(note),
                amount,
            },
        );
        self.commit();
        Some(id)
    }

    pub fn add_income(&mut self, date: NaiveDate, label: &str, amount: f64) -> Option<i64> {
        if !usable_amount(amount) {
            debug!(amount, "income rejected: zero or non-numeric amount");
            return None;
        }
        let label = match label.trim() {
            "" => DEFAULT_INCOME_LABEL,
            l => l,
        };
        let id = self.ids.next_id();
        self.doc.incomes.insert(
            0,
            Income {
                id,
                date: Some(date),
                label: label.to_string(),
                amount,
            },
        );
        self.commit();
        Some(id)
    }

    pub fn edit_expense(&mut self, id: i64, patch: ExpensePatch) -> bool {
        let Some(expense) = self.doc.expenses.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        expense.apply(patch);
        self.commit();
        true
    }

    pub fn edit_income(&mut self, id: i64, patch: IncomePatch) -> bool {
        let Some(income) = self.doc.incomes.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        income.apply(patch);
        self.commit();
        true
    }

    pub fn delete_expense(&mut self, id: i64) -> bool {
        let before = self.doc.expenses.len();
        self.doc.expenses.retain(|e| e.id != id);
        self.commit_if_changed(before, self.doc.expenses.len())
    }

    pub fn delete_income(&mut self, id: i64) -> bool {
        let before = self.doc.incomes.len();
        self.doc.incomes.retain(|i| i.id != id);
        self.commit_if_changed(before, self.doc.incomes.len())
    }

    pub fn add_debt(&mut self, name: &str, amount: f64) -> Option<i64> {
        let name = name.trim();
        if name.is_empty() || !usable_amount(amount) {
            debug!(amount, "debt rejected: blank name or zero amount");
            return None;
        }
        let id = self.ids.next_id();
        self.doc.debts.insert(
            0,
            Debt {
                id,
                name: name.to_string(),
                amount,
                done: false,
            },
        );
        self.commit();
        Some(id)
    }

    pub fn toggle_debt_done(&mut self, id: i64) -> bool {
        let Some(debt) = self.doc.debts.iter_mut().find(|d| d.id == id) else {
            return false;
        };
        debt.done = !debt.done;
        self.commit();
        true
    }

    pub fn delete_debt(&mut self, id: i64) -> bool {
        let before = self.doc.debts.len();
        self.doc.debts.retain(|d| d.id != id);
        self.commit_if_changed(before, self.doc.debts.len())
    }

    /// Append a category to the taxonomy; blank and duplicate names are ignored.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.doc.has_category(name) {
            return false;
        }
        self.doc.categories.push(name.to_string());
        self.commit();
        true
    }

    /// Remove a category from the taxonomy only. Expenses that reference it
    /// keep counting toward totals but drop out of the category breakdown.
    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.doc.categories.len();
        self.doc.categories.retain(|c| c != name);
        self.commit_if_changed(before, self.doc.categories.len())
    }

    fn commit_if_changed(&mut self, before: usize, after: usize) -> bool {
        if before == after {
            return false;
        }
        self.commit();
        true
    }
}
