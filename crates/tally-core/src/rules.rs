//! Rule mutations
//!
//! Every change to the rule set (create, edit, soft delete) is followed by a
//! full recategorization so stored auto categories always reflect the active
//! rules. Patterns are checked for compilability up front so obviously broken
//! rules are rejected before they are stored.

use serde::Serialize;
use tracing::{info, warn};

use crate::categorize::{compile_pattern, Categorizer};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CategoryRule, NewCategoryRule, RuleUpdate};

/// A rule after a mutation, with the recategorization it triggered
#[derive(Debug, Clone, Serialize)]
pub struct RuleChange {
    pub rule: CategoryRule,
    /// Effective auto-category changes (0 if recategorization failed)
    pub updated_transactions: usize,
}

/// Trim a pattern and check that it compiles
pub fn validate_pattern(pattern: &str) -> Result<String> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(Error::InvalidData("Regex pattern is required".into()));
    }
    compile_pattern(pattern)
        .map_err(|e| Error::InvalidData(format!("Invalid regex pattern: {}", e)))?;
    Ok(pattern.to_string())
}

/// Trim a category name and check that it is not blank
pub fn validate_category_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidData("Category name is required".into()));
    }
    Ok(name.to_string())
}

/// Create a rule, then recategorize
pub fn add_rule(db: &Database, rule: NewCategoryRule) -> Result<RuleChange> {
    let rule = NewCategoryRule {
        category_name: validate_category_name(&rule.category_name)?,
        pattern: validate_pattern(&rule.pattern)?,
        ..rule
    };

    let created = db.create_rule(&rule)?;
    info!(
        "Created rule {} ({} -> {})",
        created.id, created.pattern, created.category_name
    );

    Ok(RuleChange {
        updated_transactions: recategorize_after_change(db),
        rule: created,
    })
}

/// Apply a partial update to a rule, then recategorize
pub fn edit_rule(db: &Database, id: i64, update: RuleUpdate) -> Result<RuleChange> {
    let update = RuleUpdate {
        category_name: update
            .category_name
            .as_deref()
            .map(validate_category_name)
            .transpose()?,
        pattern: update.pattern.as_deref().map(validate_pattern).transpose()?,
        ..update
    };

    let updated = db.update_rule(id, &update)?;
    info!("Updated rule {}", updated.id);

    Ok(RuleChange {
        updated_transactions: recategorize_after_change(db),
        rule: updated,
    })
}

/// Soft delete a rule, then recategorize
pub fn remove_rule(db: &Database, id: i64) -> Result<RuleChange> {
    let deactivated = db.deactivate_rule(id)?;
    info!(
        "Deactivated rule {} ({})",
        deactivated.id, deactivated.category_name
    );

    Ok(RuleChange {
        updated_transactions: recategorize_after_change(db),
        rule: deactivated,
    })
}

/// Explicit full recategorization, for callers that want the error
pub fn recategorize(db: &Database) -> Result<usize> {
    db.recategorize_all()
}

/// Recategorize after a rule change that has already been stored
///
/// The rule change stands even if this pass fails; the failure is logged and
/// reported as zero updates.
fn recategorize_after_change(db: &Database) -> usize {
    match db.recategorize_all() {
        Ok(count) => count,
        Err(e) => {
            warn!("Error re-categorizing transactions: {}", e);
            0
        }
    }
}

/// What the current rules would do with a description
#[derive(Debug, Clone, Serialize)]
pub struct RuleTest {
    /// The category the engine would assign
    pub category: String,
    /// Every active rule that matches, in evaluation order
    pub matches: Vec<CategoryRule>,
    /// Active rules skipped because their pattern does not compile
    pub skipped_rules: usize,
}

/// Evaluate the active rules against a description and optional memo
pub fn test_rules(db: &Database, description: &str, memo: Option<&str>) -> Result<RuleTest> {
    let rules = db.list_active_rules()?;
    let categorizer = Categorizer::new(&rules);

    Ok(RuleTest {
        category: categorizer.categorize(description, memo).to_string(),
        matches: categorizer
            .matching_rules(description, memo)
            .into_iter()
            .cloned()
            .collect(),
        skipped_rules: categorizer.skipped(),
    })
}
