//! finlight-core: ledger document, persistence, mutations and monthly analytics

pub mod analytics;
pub mod ids;
pub mod ledger;
pub mod model;
pub mod money;
pub mod store;
pub mod time;

pub use analytics::{
    BudgetSplit, CategorySlice, DebtSummary, MonthlyAnalytics, NO_EXPENSES_LABEL, ShortfallStatus,
    category_breakdown, expenses_in_month, incomes_in_month, palette_color,
};
pub use ids::{Clock, FixedClock, IdGenerator, SystemClock};
pub use ledger::Ledger;
pub use model::{
    DEFAULT_CATEGORIES, DEFAULT_INCOME_LABEL, Debt, Expense, ExpensePatch, Income, IncomePatch,
    LedgerDocument,
};
pub use money::{format_money, round2};
pub use store::{DEFAULT_STORAGE_KEY, FileStore, KvStore, MemoryStore, PersistenceStore, StoreError};
pub use time::{current_month, format_date_human, in_month, parse_month, today};
