//! Atomic recategorization of every stored transaction

use rusqlite::params;
use tracing::info;

use super::Database;
use crate::categorize::{plan_recategorization, Categorizer};
use crate::error::Result;

impl Database {
    /// Recompute `auto_category` for every transaction against the active rules
    ///
    /// Rules and transactions are read fresh inside a single storage
    /// transaction and every auto category is rewritten, changed or not.
    /// `manual_category` is never written. Returns the number of effective
    /// updates (changed auto category, no manual override).
    ///
    /// Any error rolls the whole pass back, so no partial update is visible.
    pub fn recategorize_all(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;

        let rules = Self::load_active_rules(&db_tx)?;
        let transactions = Self::load_transactions(&db_tx)?;
        let categorizer = Categorizer::new(&rules);
        let plan = plan_recategorization(&transactions, &categorizer);

        {
            let mut stmt =
                db_tx.prepare("UPDATE transactions SET auto_category = ? WHERE id = ?")?;
            for assignment in &plan.assignments {
                stmt.execute(params![assignment.auto_category, assignment.transaction_id])?;
            }
        }

        db_tx.commit()?;

        info!(
            "Re-categorized {} transactions ({} rules, {} effective updates)",
            plan.assignments.len(),
            categorizer.len(),
            plan.updated_count
        );
        Ok(plan.updated_count)
    }
}
