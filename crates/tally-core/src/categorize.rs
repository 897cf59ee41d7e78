//! Rule-based categorization engine
//!
//! Rules are evaluated in the order they are given; the first active rule whose
//! pattern matches wins. Patterns are regular expressions (look-around
//! included) searched, not fully matched, case-insensitively against
//! `description + " " + memo`.
//!
//! A pattern that fails to compile is logged and skipped, never fatal. The
//! engine does no I/O: callers read rules and transactions and persist results.

use fancy_regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{CategoryRule, Transaction, UNCATEGORIZED};

/// Compile a rule pattern the way the engine evaluates it
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// Build the lowercase text rules are matched against
pub fn search_text(description: &str, memo: Option<&str>) -> String {
    format!("{} {}", description, memo.unwrap_or_default()).to_lowercase()
}

/// An active rule paired with its compiled pattern
struct CompiledRule {
    rule: CategoryRule,
    regex: Regex,
}

impl CompiledRule {
    /// A match attempt that exceeds the backtrack limit counts as no match
    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text).unwrap_or_else(|e| {
            warn!(
                "Rule {} ({}) failed to evaluate: {}",
                self.rule.id, self.rule.category_name, e
            );
            false
        })
    }
}

/// Categorizes transactions against a fixed, ordered rule list
pub struct Categorizer {
    rules: Vec<CompiledRule>,
    skipped: usize,
}

impl Categorizer {
    /// Compile the active rules, keeping their order
    pub fn new(rules: &[CategoryRule]) -> Self {
        let mut skipped = 0;
        let compiled = rules
            .iter()
            .filter(|rule| rule.is_active())
            .filter_map(|rule| match compile_pattern(&rule.pattern) {
                Ok(regex) => Some(CompiledRule {
                    rule: rule.clone(),
                    regex,
                }),
                Err(e) => {
                    warn!(
                        "Skipping rule {} ({}): invalid pattern '{}': {}",
                        rule.id, rule.category_name, rule.pattern, e
                    );
                    skipped += 1;
                    None
                }
            })
            .collect();

        Self {
            rules: compiled,
            skipped,
        }
    }

    /// Number of active rules that will be evaluated
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of active rules dropped because their pattern did not compile
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Category for a description and memo, or `UNCATEGORIZED`
    pub fn categorize(&self, description: &str, memo: Option<&str>) -> &str {
        let text = search_text(description, memo);
        match self.rules.iter().find(|c| c.is_match(&text)) {
            Some(compiled) => {
                debug!(
                    "Rule matched for '{}': {}",
                    description, compiled.rule.category_name
                );
                compiled.rule.category_name.as_str()
            }
            None => UNCATEGORIZED,
        }
    }

    /// Every active rule matching a description and memo, in evaluation order
    pub fn matching_rules(&self, description: &str, memo: Option<&str>) -> Vec<&CategoryRule> {
        let text = search_text(description, memo);
        self.rules
            .iter()
            .filter(|c| c.is_match(&text))
            .map(|c| &c.rule)
            .collect()
    }
}

/// New auto category for one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    pub transaction_id: i64,
    pub auto_category: String,
}

/// Outcome of recomputing auto categories for a set of transactions
#[derive(Debug, Clone, Default)]
pub struct RecategorizationPlan {
    /// One entry per transaction; written unconditionally
    pub assignments: Vec<Reassignment>,
    /// Transactions whose auto category changed and that have no manual override
    pub updated_count: usize,
}

/// Recompute the auto category of every transaction
///
/// Manual categories are read only to decide whether a change counts as
/// effective; they are never part of the plan.
pub fn plan_recategorization(
    transactions: &[Transaction],
    categorizer: &Categorizer,
) -> RecategorizationPlan {
    let mut plan = RecategorizationPlan {
        assignments: Vec::with_capacity(transactions.len()),
        updated_count: 0,
    };

    for tx in transactions {
        let new_category = categorizer.categorize(&tx.description, tx.memo.as_deref());
        let changed = tx.auto_category.as_deref() != Some(new_category);

        if changed && tx.manual_category.is_none() {
            debug!(
                "Updated: {} -> {}",
                tx.description.chars().take(50).collect::<String>(),
                new_category
            );
            plan.updated_count += 1;
        }

        plan.assignments.push(Reassignment {
            transaction_id: tx.id,
            auto_category: new_category.to_string(),
        });
    }

    plan
}
