//! Ledger document types: the persisted root and its record collections.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::time::current_month;

/// Label given to an income whose label is blank.
pub const DEFAULT_INCOME_LABEL: &str = "Income";

/// Category used when the taxonomy is empty.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Taxonomy seeded into a fresh document.
pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "Home",
    "Food",
    "Transport",
    "Bills",
    "Health",
    "Clothing",
    "Hobby",
    "Other",
    "Education",
    "Travel",
    "Coffee/Eating out",
    "Gifts",
];

/// The persisted root: every record for every month plus the active month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerDocument {
    /// Year-month (`YYYY-MM`) that scopes analytics and export
    #[serde(rename = "monthISO")]
    pub active_month: String,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub debts: Vec<Debt>,
}

impl LedgerDocument {
    /// Fresh document for the given month with the default taxonomy.
    pub fn seeded(active_month: impl Into<String>) -> Self {
        Self {
            active_month: active_month.into(),
            incomes: Vec::new(),
            expenses: Vec::new(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            debts: Vec::new(),
        }
    }

    /// Largest id across all collections, if any record exists.
    pub fn max_id(&self) -> Option<i64> {
        let incomes = self.incomes.iter().map(|i| i.id);
        let expenses = self.expenses.iter().map(|e| e.id);
        let debts = self.debts.iter().map(|d| d.id);
        incomes.chain(expenses).chain(debts).max()
    }

    /// First category of the taxonomy, used as the default pick for new expenses.
    pub fn default_category(&self) -> &str {
        self.categories
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

impl Default for LedgerDocument {
    fn default() -> Self {
        Self::seeded(current_month())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: i64,
    /// `None` when the stored date is blank or unreadable
    #[serde(default, with = "record_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: i64,
    #[serde(default, with = "record_date")]
    pub date: Option<NaiveDate>,
    /// Name copied from the taxonomy at creation time; not kept in sync with it
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Debt {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub done: bool,
}

/// Fields to overwrite on an existing expense; `None` leaves a field as is.
/// A non-finite amount is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    /// `Some("")` clears the note
    pub note: Option<String>,
    pub amount: Option<f64>,
}

/// Fields to overwrite on an existing income; `None` leaves a field as is.
/// A non-finite amount is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomePatch {
    pub date: Option<NaiveDate>,
    pub label: Option<String>,
    pub amount: Option<f64>,
}

impl Expense {
    pub fn apply(&mut self, patch: ExpensePatch) {
        if let Some(date) = patch.date {
            self.date = Some(date);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(note) = patch.note {
            self.note = normalize_note(&note);
        }
        if let Some(amount) = patch.amount.filter(|a| a.is_finite()) {
            self.amount = amount;
        }
    }
}

impl Income {
    pub fn apply(&mut self, patch: IncomePatch) {
        if let Some(date) = patch.date {
            self.date = Some(date);
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(amount) = patch.amount.filter(|a| a.is_finite()) {
            self.amount = amount;
        }
    }
}

/// Trim a free-text note; empty notes are not stored.
pub fn normalize_note(note: &str) -> Option<String> {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Amounts in stored documents may be numbers, numeric strings, or junk.
/// Anything that is not a finite number reads as 0.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let amount = match raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if amount.is_finite() { amount } else { 0.0 })
}

/// Record dates are stored as `YYYY-MM-DD`; a cleared date is stored as `""`.
/// Blank or malformed values load as `None` so one bad record never
/// invalidates the whole document.
mod record_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.collect_str(&d.format(FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::String(s) => NaiveDate::parse_from_str(s.trim(), FORMAT).ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_document_has_taxonomy() {
        let doc = LedgerDocument::seeded("2024-03");
        assert_eq!(doc.active_month, "2024-03");
        assert_eq!(doc.categories.len(), DEFAULT_CATEGORIES.len());
        assert_eq!(doc.default_category(), "Home");
        assert!(doc.incomes.is_empty() && doc.expenses.is_empty() && doc.debts.is_empty());
        assert_eq!(doc.max_id(), None);
    }

    #[test]
    fn test_stored_document_uses_month_iso_key() {
        let doc = LedgerDocument::seeded("2024-03");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["monthISO"], "2024-03");
        assert!(json.get("active_month").is_none());
    }

    #[test]
    fn test_lenient_amounts() {
        let raw = r#"{
            "monthISO": "2024-03",
            "incomes": [
                {"id": 1, "date": "2024-03-01", "label": "Salary", "amount": "1200.5"},
                {"id": 2, "date": "2024-03-02", "label": "Gift", "amount": "abc"},
                {"id": 3, "date": "2024-03-03", "label": "Bonus", "amount": null}
            ],
            "debts": [{"id": 4, "name": "Car", "amount": 300}]
        }"#;
        let doc: LedgerDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.incomes[0].amount, 1200.5);
        assert_eq!(doc.incomes[1].amount, 0.0);
        assert_eq!(doc.incomes[2].amount, 0.0);
        assert!(!doc.debts[0].done);
        assert!(doc.expenses.is_empty());
        assert_eq!(doc.max_id(), Some(4));
    }

    #[test]
    fn test_expense_patch() {
        let mut e = Expense {
            id: 7,
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            category: "Food".to_string(),
            note: Some("lunch".to_string()),
            amount: 12.0,
        };
        e.apply(ExpensePatch {
            amount: Some(15.5),
            note: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(e.amount, 15.5);
        assert_eq!(e.note, None);
        assert_eq!(e.category, "Food");
        assert_eq!(e.id, 7);

        e.apply(ExpensePatch {
            amount: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(e.amount, 15.5);
        e.apply(ExpensePatch {
            amount: Some(f64::INFINITY),
            ..Default::default()
        });
        assert_eq!(e.amount, 15.5);
    }

    #[test]
    fn test_income_patch_ignores_non_finite_amount() {
        let mut i = Income {
            id: 3,
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            label: "Salary".to_string(),
            amount: 100.0,
        };
        i.apply(IncomePatch {
            amount: Some(f64::NEG_INFINITY),
            label: Some("Wage".to_string()),
            ..Default::default()
        });
        assert_eq!(i.amount, 100.0);
        assert_eq!(i.label, "Wage");
    }

    #[test]
    fn test_blank_or_bad_dates_load_as_none() {
        let raw = r#"{
            "monthISO": "2024-03",
            "incomes": [{"id": 1, "date": "2024-03-01", "label": "Salary", "amount": 100}],
            "expenses": [
                {"id": 2, "date": "", "category": "Food", "amount": 5},
                {"id": 3, "date": "05/03/2024", "category": "Food", "amount": 6},
                {"id": 4, "category": "Food", "amount": 7},
                {"id": 5, "date": "2024-03-05", "category": "Food", "amount": 8}
            ],
            "debts": [{"id": 6, "name": "Car", "amount": 300}]
        }"#;
        let doc: LedgerDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.incomes.len(), 1);
        assert_eq!(doc.expenses.len(), 4);
        assert_eq!(doc.debts.len(), 1);
        assert_eq!(doc.expenses[0].date, None);
        assert_eq!(doc.expenses[1].date, None);
        assert_eq!(doc.expenses[2].date, None);
        assert_eq!(doc.expenses[3].date, NaiveDate::from_ymd_opt(2024, 3, 5));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["expenses"][0]["date"], "");
        assert_eq!(json["expenses"][3]["date"], "2024-03-05");
    }
}
