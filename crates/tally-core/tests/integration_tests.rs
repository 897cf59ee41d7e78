//! Integration tests for tally-core
//!
//! These tests exercise the full import → categorize → rule change → recategorize workflow.

use rust_decimal::prelude::*;
use tally_core::{
    db::Database,
    import_csv,
    models::{NewCategoryRule, RuleUpdate, SchemaOrigin, TransactionQuery, UNCATEGORIZED},
    rules::{add_rule, edit_rule, remove_rule, test_rules},
};

/// Schema 1 export: Transaction Date,Post Date,Description,Category,Type,Amount,Memo
fn schema1_csv() -> &'static str {
    r#"Transaction Date,Post Date,Description,Category,Type,Amount,Memo
01/15/2024,01/16/2024,STARBUCKS #123,Food & Drink,Sale,-4.50,
01/17/2024,01/18/2024,SHELL OIL 5741,Gas,Sale,-38.20,
01/18/2024,01/19/2024,WALMART SUPERCENTER,Shopping,Sale,-82.13,
01/20/2024,01/21/2024,NETFLIX.COM,Entertainment,Sale,-15.49,
,01/22/2024,PENDING CHARGE,Shopping,Sale,-1.00,
01/23/2024,01/24/2024,AUTOMATIC PAYMENT - THANK,,Payment,500.00,"#
}

/// Schema 2 export: Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
fn schema2_csv() -> &'static str {
    r#"Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
DEBIT,02/01/2024,UBER TRIP HELP.UBER.COM,-23.10,DEBIT_CARD,1976.90,
CHECK,02/03/2024,CHECK 1042,-300.00,CHECK_PAID,1676.90,1042
CREDIT,02/05/2024,PAYROLL ACME CORP,2500.00,ACH_CREDIT,4176.90,
DEBIT,02/06/2024,CITY ELECTRIC,not-a-number,ACH_DEBIT,,"#
}

fn find<'a>(
    txs: &'a [tally_core::Transaction],
    description: &str,
) -> &'a tally_core::Transaction {
    txs.iter()
        .find(|t| t.description == description)
        .unwrap_or_else(|| panic!("transaction {} not found", description))
}

// =============================================================================
// Import Integration Tests
// =============================================================================

#[test]
fn test_schema1_import_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    db.seed_default_rules().unwrap();

    let summary = import_csv(&db, schema1_csv().as_bytes()).expect("Import should succeed");
    assert_eq!(summary.schema, SchemaOrigin::Schema1);
    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.saved_transactions, 5);
    assert_eq!(summary.skipped_undated, 1);
    assert!(summary.failures.is_empty());

    let txs = db.all_transactions().unwrap();
    assert_eq!(txs.len(), 5);

    let starbucks = find(&txs, "STARBUCKS #123");
    assert_eq!(
        starbucks.transaction_date,
        chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    );
    assert_eq!(starbucks.amount, dec!(-4.50));
    assert_eq!(starbucks.category, "Food & Drink");
    assert_eq!(starbucks.auto_category.as_deref(), Some("Eating Out"));

    assert_eq!(
        find(&txs, "SHELL OIL 5741").auto_category.as_deref(),
        Some("Fuel")
    );
    // Groceries precedes Shopping
    assert_eq!(
        find(&txs, "WALMART SUPERCENTER").auto_category.as_deref(),
        Some("Groceries")
    );
    assert_eq!(
        find(&txs, "NETFLIX.COM").auto_category.as_deref(),
        Some(UNCATEGORIZED)
    );
}

#[test]
fn test_schema2_import_workflow() {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();

    let summary = import_csv(&db, schema2_csv().as_bytes()).unwrap();
    assert_eq!(summary.schema, SchemaOrigin::Schema2);
    assert_eq!(summary.total_rows, 4);
    assert_eq!(summary.saved_transactions, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].row, 4);

    let txs = db.all_transactions().unwrap();

    let uber = find(&txs, "UBER TRIP HELP.UBER.COM");
    assert_eq!(uber.category, "");
    assert_eq!(uber.memo.as_deref(), Some("DEBIT"));
    assert_eq!(uber.post_date, Some(uber.transaction_date));
    assert_eq!(uber.balance, Some(dec!(1976.90)));
    assert_eq!(uber.auto_category.as_deref(), Some("Transportation"));

    let check = find(&txs, "CHECK 1042");
    assert_eq!(check.check_number.as_deref(), Some("1042"));
    assert_eq!(check.memo.as_deref(), Some("CHECK"));
}

#[test]
fn test_repeated_import_appends() {
    let db = Database::in_memory().unwrap();
    import_csv(&db, schema2_csv().as_bytes()).unwrap();
    import_csv(&db, schema2_csv().as_bytes()).unwrap();
    assert_eq!(db.count_transactions().unwrap(), 6);
}

// =============================================================================
// Rule Change Integration Tests
// =============================================================================

#[test]
fn test_rule_changes_recategorize() {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();
    import_csv(&db, schema1_csv().as_bytes()).unwrap();

    // NETFLIX moves out of Uncategorized
    let change = add_rule(&db, NewCategoryRule::new("Streaming", "netflix|hulu")).unwrap();
    assert_eq!(change.updated_transactions, 1);

    let txs = db.all_transactions().unwrap();
    assert_eq!(
        find(&txs, "NETFLIX.COM").auto_category.as_deref(),
        Some("Streaming")
    );

    // Moving the new rule to the front changes nothing else
    let change = edit_rule(
        &db,
        change.rule.id,
        RuleUpdate {
            position: Some(-1),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(change.updated_transactions, 0);

    // Deactivating it sends NETFLIX back
    let change = remove_rule(&db, change.rule.id).unwrap();
    assert_eq!(change.updated_transactions, 1);
    let txs = db.all_transactions().unwrap();
    assert_eq!(
        find(&txs, "NETFLIX.COM").auto_category.as_deref(),
        Some(UNCATEGORIZED)
    );
}

#[test]
fn test_manual_override_survives_rule_changes() {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();
    import_csv(&db, schema1_csv().as_bytes()).unwrap();

    let txs = db.all_transactions().unwrap();
    let shell_id = find(&txs, "SHELL OIL 5741").id;
    db.set_manual_category(shell_id, Some("Car")).unwrap();

    // Shell changes auto category but has an override, so it is not counted
    let change = add_rule(&db, NewCategoryRule {
        position: Some(-1),
        ..NewCategoryRule::new("Gas Station", "shell")
    })
    .unwrap();
    assert_eq!(change.updated_transactions, 0);

    let shell = db.get_transaction(shell_id).unwrap().unwrap();
    assert_eq!(shell.auto_category.as_deref(), Some("Gas Station"));
    assert_eq!(shell.manual_category.as_deref(), Some("Car"));
    assert_eq!(shell.display_category(), Some("Car"));

    let page = db
        .list_transactions(&TransactionQuery {
            category: Some("car".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.total, 1);
}

#[test]
fn test_failed_recategorize_after_rule_change_reports_zero() {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();
    import_csv(&db, schema1_csv().as_bytes()).unwrap();

    let conn = db.conn().unwrap();
    conn.execute_batch(
        r#"
        CREATE TRIGGER block_netflix BEFORE UPDATE OF auto_category ON transactions
        WHEN NEW.description = 'NETFLIX.COM'
        BEGIN
            SELECT RAISE(ABORT, 'blocked');
        END;
        "#,
    )
    .unwrap();
    drop(conn);

    let change = add_rule(&db, NewCategoryRule::new("Streaming", "netflix")).unwrap();
    assert_eq!(change.updated_transactions, 0);
    assert!(change.rule.is_active());

    // The rule is stored even though stored categories were left untouched
    assert!(db.get_rule(change.rule.id).unwrap().is_some());
    let txs = db.all_transactions().unwrap();
    assert_eq!(
        find(&txs, "NETFLIX.COM").auto_category.as_deref(),
        Some(UNCATEGORIZED)
    );
    assert!(db.recategorize_all().is_err());
}

#[test]
fn test_first_match_wins_scenario() {
    let db = Database::in_memory().unwrap();
    add_rule(&db, NewCategoryRule::new("Groceries", "walmart")).unwrap();
    add_rule(&db, NewCategoryRule::new("Shopping", "walmart|target")).unwrap();

    let result = test_rules(&db, "WALMART SUPERCENTER", None).unwrap();
    assert_eq!(result.category, "Groceries");
    assert_eq!(result.matches.len(), 2);
}

#[test]
fn test_default_shopping_rule_skips_food_without_groceries() {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();
    let groceries = db
        .list_active_rules()
        .unwrap()
        .into_iter()
        .find(|r| r.category_name == "Groceries")
        .unwrap();
    remove_rule(&db, groceries.id).unwrap();

    let csv = "Transaction Date,Post Date,Description,Category,Type,Amount,Memo
03/01/2024,03/02/2024,WALMART FOOD,Groceries,Sale,-12.00,
03/02/2024,03/03/2024,WALMART SUPERCENTER,Shopping,Sale,-40.00,
03/03/2024,03/04/2024,TARGET 0042,Shopping,Sale,-9.99,groceries and food
";
    import_csv(&db, csv.as_bytes()).unwrap();

    let txs = db.all_transactions().unwrap();
    assert_eq!(
        find(&txs, "WALMART FOOD").auto_category.as_deref(),
        Some(UNCATEGORIZED)
    );
    assert_eq!(
        find(&txs, "WALMART SUPERCENTER").auto_category.as_deref(),
        Some("Shopping")
    );
    assert_eq!(
        find(&txs, "TARGET 0042").auto_category.as_deref(),
        Some(UNCATEGORIZED)
    );
}

// =============================================================================
// Stats Integration Tests
// =============================================================================

#[test]
fn test_stats_after_import() {
    let db = Database::in_memory().unwrap();
    db.seed_default_rules().unwrap();
    import_csv(&db, schema1_csv().as_bytes()).unwrap();
    import_csv(&db, schema2_csv().as_bytes()).unwrap();

    let stats = db.category_stats().unwrap();
    assert_eq!(stats.total_transactions, 8);
    assert_eq!(
        stats.date_range.earliest,
        chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
    );
    assert_eq!(
        stats.date_range.latest,
        chrono::NaiveDate::from_ymd_opt(2024, 2, 5)
    );

    let uncategorized = stats
        .categories
        .iter()
        .find(|c| c.category.as_deref() == Some(UNCATEGORIZED))
        .unwrap();
    // NETFLIX, the card payment, the check and payroll
    assert_eq!(uncategorized.count, 4);
    assert_eq!(
        uncategorized.total_amount,
        dec!(-15.49) + dec!(500.00) + dec!(-300.00) + dec!(2500.00)
    );
}
