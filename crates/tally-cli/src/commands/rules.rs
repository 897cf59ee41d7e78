//! Category rule command implementations

use anyhow::Result;
use tally_core::db::Database;
use tally_core::models::{CategoryRule, NewCategoryRule, RuleUpdate};
use tally_core::rules::{add_rule, edit_rule, remove_rule, test_rules};

use super::truncate;

fn print_rule(rule: &CategoryRule) {
    let status = if rule.is_active() { "" } else { " (inactive)" };
    println!(
        "   [{:>3}] #{:<3} {:<18} {}{}",
        rule.id,
        rule.position,
        truncate(&rule.category_name, 18),
        rule.pattern,
        status
    );
}

pub fn cmd_rules_list(db: &Database, include_inactive: bool) -> Result<()> {
    let rules = db.list_rules(include_inactive)?;

    if rules.is_empty() {
        println!("No category rules found. Run 'tally init' to seed the defaults.");
        return Ok(());
    }

    println!();
    println!("📋 Category Rules (first match wins)");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   [ id] pos  category           pattern");

    for rule in &rules {
        print_rule(rule);
    }

    Ok(())
}

pub fn cmd_rules_add(
    db: &Database,
    category: &str,
    pattern: &str,
    position: Option<i64>,
) -> Result<()> {
    let rule = NewCategoryRule {
        position,
        ..NewCategoryRule::new(category, pattern)
    };
    let change = add_rule(db, rule)?;

    println!("✅ Added rule {}", change.rule.id);
    print_rule(&change.rule);
    println!(
        "   Re-categorized {} transactions",
        change.updated_transactions
    );

    Ok(())
}

pub fn cmd_rules_update(db: &Database, id: i64, update: RuleUpdate) -> Result<()> {
    if update.is_empty() {
        anyhow::bail!(
            "Nothing to update. Use --category, --pattern, --position, --activate or --deactivate"
        );
    }

    let change = edit_rule(db, id, update)?;

    println!("✅ Updated rule {}", id);
    print_rule(&change.rule);
    println!(
        "   Re-categorized {} transactions",
        change.updated_transactions
    );

    Ok(())
}

pub fn cmd_rules_delete(db: &Database, id: i64) -> Result<()> {
    let change = remove_rule(db, id)?;

    println!(
        "✅ Deleted rule {} ({})",
        id, change.rule.category_name
    );
    println!(
        "   Re-categorized {} transactions",
        change.updated_transactions
    );
    println!(
        "   The rule is kept as inactive; restore it with 'tally rules update {} --activate'",
        id
    );

    Ok(())
}

pub fn cmd_rules_test(db: &Database, description: &str, memo: Option<&str>) -> Result<()> {
    let result = test_rules(db, description, memo)?;

    println!();
    println!("🧪 Testing: \"{}\"", description);
    if let Some(memo) = memo {
        println!("   Memo: \"{}\"", memo);
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Category: {}", result.category);

    if result.matches.is_empty() {
        println!("   No active rule matches");
    } else {
        println!("   Matching rules, in evaluation order:");
        for rule in &result.matches {
            print_rule(rule);
        }
    }

    if result.skipped_rules > 0 {
        println!(
            "   ⚠️  {} active rules skipped (pattern does not compile)",
            result.skipped_rules
        );
    }

    Ok(())
}
