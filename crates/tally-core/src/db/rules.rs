//! Category rule operations
//!
//! Rules are ordered by an explicit `position` column and are never deleted;
//! removal sets the status to inactive.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CategoryRule, NewCategoryRule, RuleStatus, RuleUpdate};

/// Rules installed into an empty rule table, in evaluation order
pub const DEFAULT_RULES: [(&str, &str); 6] = [
    (
        "Groceries",
        "grocery|supermarket|food|kroger|walmart|target.*food|whole foods|trader joe|safeway",
    ),
    (
        "Eating Out",
        "restaurant|mcdonald|burger|pizza|taco|subway|starbucks|coffee|cafe|diner",
    ),
    ("Fuel", "gas|fuel|shell|exxon|bp|chevron|mobil|station"),
    (
        "Shopping",
        "amazon|ebay|store|shop|retail|mall|target(?!.*food)|walmart(?!.*food)|costco",
    ),
    (
        "Utilities",
        "electric|water|gas company|utility|phone|internet|cable",
    ),
    ("Transportation", "uber|lyft|taxi|bus|train|parking|toll"),
];

const RULE_COLUMNS: &str =
    "id, category_name, pattern, position, status, created_at, updated_at";

impl Database {
    /// Install the default rules if the rule table is empty
    ///
    /// Returns the number of rules installed (0 when any rule already exists,
    /// active or not).
    pub fn seed_default_rules(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;

        let existing: i64 =
            db_tx.query_row("SELECT COUNT(*) FROM category_rules", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        for (position, (name, pattern)) in DEFAULT_RULES.iter().enumerate() {
            db_tx.execute(
                "INSERT INTO category_rules (category_name, pattern, position) VALUES (?, ?, ?)",
                params![name, pattern, position as i64],
            )?;
        }
        db_tx.commit()?;

        info!("Seeded {} default category rules", DEFAULT_RULES.len());
        Ok(DEFAULT_RULES.len())
    }

    /// Active rules in evaluation order
    pub fn list_active_rules(&self) -> Result<Vec<CategoryRule>> {
        let conn = self.conn()?;
        Self::load_active_rules(&conn)
    }

    /// Load active rules through an existing connection or storage transaction
    pub(crate) fn load_active_rules(conn: &Connection) -> Result<Vec<CategoryRule>> {
        let sql = format!(
            "SELECT {} FROM category_rules WHERE status = 'active' ORDER BY position, id",
            RULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map([], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// All rules in evaluation order, optionally including inactive ones
    pub fn list_rules(&self, include_inactive: bool) -> Result<Vec<CategoryRule>> {
        if !include_inactive {
            return self.list_active_rules();
        }

        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM category_rules ORDER BY position, id",
            RULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map([], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Get a rule by ID
    pub fn get_rule(&self, id: i64) -> Result<Option<CategoryRule>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM category_rules WHERE id = ?", RULE_COLUMNS);
        let rule = conn
            .query_row(&sql, params![id], Self::row_to_rule)
            .optional()?;
        Ok(rule)
    }

    /// Insert a rule
    ///
    /// Without an explicit position the rule goes after every existing rule.
    pub fn create_rule(&self, rule: &NewCategoryRule) -> Result<CategoryRule> {
        let conn = self.conn()?;

        let position = match rule.position {
            Some(p) => p,
            None => conn.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM category_rules",
                [],
                |row| row.get(0),
            )?,
        };

        conn.execute(
            r#"
            INSERT INTO category_rules (category_name, pattern, position, status)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                rule.category_name,
                rule.pattern,
                position,
                rule.status.as_str()
            ],
        )?;
        let id = conn.last_insert_rowid();

        self.get_rule(id)?
            .ok_or_else(|| Error::NotFound(format!("Category rule {} not found", id)))
    }

    /// Apply a partial update; `updated_at` is refreshed even when nothing else changes
    pub fn update_rule(&self, id: i64, update: &RuleUpdate) -> Result<CategoryRule> {
        let conn = self.conn()?;

        let updated = conn.execute(
            r#"
            UPDATE category_rules SET
                category_name = COALESCE(?, category_name),
                pattern = COALESCE(?, pattern),
                status = COALESCE(?, status),
                position = COALESCE(?, position),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                update.category_name,
                update.pattern,
                update.status.map(|s| s.as_str()),
                update.position,
                id
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Category rule {} not found", id)));
        }

        self.get_rule(id)?
            .ok_or_else(|| Error::NotFound(format!("Category rule {} not found", id)))
    }

    /// Soft delete: mark the rule inactive, keeping the row
    pub fn deactivate_rule(&self, id: i64) -> Result<CategoryRule> {
        self.update_rule(
            id,
            &RuleUpdate {
                status: Some(RuleStatus::Inactive),
                ..Default::default()
            },
        )
    }

    fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<CategoryRule> {
        let status_str: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;
        Ok(CategoryRule {
            id: row.get(0)?,
            category_name: row.get(1)?,
            pattern: row.get(2)?,
            position: row.get(3)?,
            status: status_str.parse().unwrap_or(RuleStatus::Inactive),
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
