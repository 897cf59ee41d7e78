//! Transaction command implementations

use anyhow::Result;
use tally_core::db::Database;
use tally_core::models::TransactionQuery;

use super::{format_amount, truncate};

pub fn cmd_transactions_list(db: &Database, query: &TransactionQuery) -> Result<()> {
    let page = db.list_transactions(query)?;

    if page.total == 0 {
        println!("No transactions found. Import some with:");
        println!("  tally import --file statement.csv");
        return Ok(());
    }

    println!();
    println!(
        "📝 Transactions (page {} of {}, {} total)",
        page.page,
        page.pages.max(1),
        page.total
    );
    println!("   ─────────────────────────────────────────────────────────────────────────");

    for tx in &page.transactions {
        let category = match (&tx.manual_category, tx.display_category()) {
            (Some(manual), _) => format!("{} ✎", manual),
            (None, Some(auto)) => auto.to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "   [{:>5}] {} │ {:>10} │ {:<18} │ {}",
            tx.id,
            tx.transaction_date,
            format_amount(tx),
            truncate(&category, 18),
            truncate(&tx.description, 40)
        );
    }

    if page.page < page.pages {
        println!();
        println!("   Next page: --page {}", page.page + 1);
    }

    Ok(())
}

pub fn cmd_categorize(db: &Database, id: i64, category: Option<&str>) -> Result<()> {
    let tx = db.set_manual_category(id, category)?;

    match &tx.manual_category {
        Some(manual) => println!("✅ Transaction {} categorized as {}", id, manual),
        None => println!(
            "✅ Cleared manual category of transaction {} (now {})",
            id,
            tx.display_category().unwrap_or("-")
        ),
    }
    println!(
        "   {} │ {} │ {}",
        tx.transaction_date,
        format_amount(&tx),
        truncate(&tx.description, 40)
    );

    Ok(())
}
