//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category assigned when no active rule matches
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Default page size for transaction listings
pub const DEFAULT_PER_PAGE: i64 = 100;

/// Upper bound on page size for transaction listings
pub const MAX_PER_PAGE: i64 = 1000;

/// The statement layout a transaction was imported from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaOrigin {
    /// Transaction Date, Post Date, Description, Category, Type, Amount, Memo
    #[serde(rename = "format1")]
    Schema1,
    /// Details, Posting Date, Description, Amount, Type, Balance, Check or Slip #
    #[serde(rename = "format2")]
    Schema2,
}

impl SchemaOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema1 => "format1",
            Self::Schema2 => "format2",
        }
    }
}

impl std::str::FromStr for SchemaOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "format1" | "schema1" => Ok(Self::Schema1),
            "format2" | "schema2" => Ok(Self::Schema2),
            _ => Err(format!("Unknown statement schema: {}", s)),
        }
    }
}

impl std::fmt::Display for SchemaOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_date: NaiveDate,
    /// Equals `transaction_date` for schema 2 imports
    pub post_date: Option<NaiveDate>,
    pub description: String,
    /// Bank-supplied category label (always empty for schema 2)
    pub category: String,
    pub transaction_type: String,
    /// Sign follows the exporting bank
    pub amount: Decimal,
    pub memo: Option<String>,
    /// Assigned by the rule engine, recomputed whenever rules change
    pub auto_category: Option<String>,
    /// User override, never touched by recategorization
    pub manual_category: Option<String>,
    pub balance: Option<Decimal>,
    pub check_number: Option<String>,
    pub schema_origin: SchemaOrigin,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The category to show: the manual override when set, otherwise the rule result
    pub fn display_category(&self) -> Option<&str> {
        self.manual_category
            .as_deref()
            .or(self.auto_category.as_deref())
    }
}

/// A new transaction to be stored (before DB insertion)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub transaction_date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    pub category: String,
    pub transaction_type: String,
    pub amount: Decimal,
    pub memo: Option<String>,
    pub auto_category: Option<String>,
    pub balance: Option<Decimal>,
    pub check_number: Option<String>,
    pub schema_origin: SchemaOrigin,
}

/// Lifecycle state of a category rule
///
/// Rules are never hard-deleted; removing a rule moves it to `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn from_active(active: bool) -> Self {
        if active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl std::str::FromStr for RuleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown rule status: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-maintained rule mapping a regex pattern to a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: i64,
    pub category_name: String,
    /// Regular expression, matched case-insensitively against description and memo
    pub pattern: String,
    /// Evaluation order, lowest first
    pub position: i64,
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryRule {
    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }
}

/// A new category rule (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewCategoryRule {
    pub category_name: String,
    pub pattern: String,
    pub status: RuleStatus,
    /// Explicit position; appended after the last rule when `None`
    pub position: Option<i64>,
}

impl NewCategoryRule {
    pub fn new(category_name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            category_name: category_name.into(),
            pattern: pattern.into(),
            status: RuleStatus::Active,
            position: None,
        }
    }
}

/// Partial update for a category rule; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub category_name: Option<String>,
    pub pattern: Option<String>,
    pub status: Option<RuleStatus>,
    pub position: Option<i64>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.category_name.is_none()
            && self.pattern.is_none()
            && self.status.is_none()
            && self.position.is_none()
    }
}

/// Filters and paging for transaction listings
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    /// Case-insensitive substring of the transaction type
    pub transaction_type: Option<String>,
    /// Case-insensitive substring of the manual or auto category
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 1-based page number
    pub page: i64,
    pub per_page: i64,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            transaction_type: None,
            category: None,
            start_date: None,
            end_date: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of a transaction listing
#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Count and total for one display category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    /// `None` for transactions with neither a manual nor an auto category
    pub category: Option<String>,
    pub count: i64,
    pub total_amount: Decimal,
}

/// Earliest and latest transaction dates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

/// Summary statistics over all stored transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub total_transactions: i64,
    pub date_range: DateRange,
    pub categories: Vec<CategorySummary>,
}
