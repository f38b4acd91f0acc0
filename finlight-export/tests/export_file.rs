use chrono::NaiveDate;
use finlight_core::{FixedClock, Ledger, MemoryStore, PersistenceStore};
use finlight_export::{ExportError, UTF8_BOM, write_month_csv};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Records entered through the ledger come out newest first, expenses then incomes.
#[test]
fn test_ledger_month_written_to_named_file() {
    let mut ledger = Ledger::open_with_clock(
        PersistenceStore::new(MemoryStore::new()),
        FixedClock(1),
    );
    ledger.set_active_month("2024-03");
    ledger.add_income(d(2024, 3, 1), "Salary", 100.0);
    ledger.add_expense(d(2024, 3, 5), "Food", "lunch, with friends", 80.0);
    ledger.add_expense(d(2024, 3, 6), "Transport", "", 2.4);
    ledger.add_expense(d(2024, 2, 28), "Food", "", 5.0);

    let dir = tempfile::tempdir().unwrap();
    let path = write_month_csv(dir.path(), ledger.document()).unwrap();
    assert_eq!(path.file_name().unwrap(), "finances_2024-03.csv");

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
    let body = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
    let rows: Vec<&str> = body.split('\n').collect();
    assert_eq!(
        rows,
        vec![
            "Type,Date,Category/Label,Note,Amount",
            "expense,06.03.24,Transport,,2.4",
            "expense,05.03.24,Food,lunch; with friends,80",
            "income,01.03.24,Salary,,100",
        ]
    );
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let doc = finlight_core::LedgerDocument::seeded("2024-03");
    let err = write_month_csv(dir.path().join("nope"), &doc).unwrap_err();
    assert!(matches!(err, ExportError::MissingDir(_)));
}
