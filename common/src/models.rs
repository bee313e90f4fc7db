use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Customer Models
// ============================================================================

/// Customer represents an organization that licenses are sold to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Partial customer update. `name` and `is_active` keep their current
/// value when absent; the detail fields are replaced outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Product Models
// ============================================================================

/// Product represents a licensable piece of software
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub vendor: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub default_term_months: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub vendor: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub default_term_months: Option<i32>,
    pub notes: Option<String>,
}

// ============================================================================
// License Models
// ============================================================================

/// License represents one purchased license of a product for a customer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct License {
    pub id: i64,
    pub public_id: Uuid,
    pub customer_id: i64,
    pub product_id: i64,
    #[sqlx(try_from = "String")]
    pub status: LicenseStatus,
    #[sqlx(try_from = "String")]
    pub term_type: TermType,
    pub license_key: Option<String>,
    pub seats: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub auto_renew: bool,
    pub renewal_notes: Option<String>,
    pub po_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a license. Status defaults to `ordered` and the
/// term type to `subscription` when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLicense {
    pub customer_id: i64,
    pub product_id: i64,
    pub status: Option<LicenseStatus>,
    pub term_type: Option<TermType>,
    pub license_key: Option<String>,
    pub seats: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub auto_renew: bool,
    pub renewal_notes: Option<String>,
    pub po_number: Option<String>,
    pub notes: Option<String>,
}

/// Partial license update; absent fields keep their current value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseUpdate {
    pub status: Option<LicenseStatus>,
    pub term_type: Option<TermType>,
    pub license_key: Option<String>,
    pub seats: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub auto_renew: Option<bool>,
    pub renewal_notes: Option<String>,
    pub po_number: Option<String>,
    pub notes: Option<String>,
}

/// LicenseStatus tracks a license through its commercial lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Ordered,
    Active,
    Expired,
    Cancelled,
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseStatus::Ordered => write!(f, "ordered"),
            LicenseStatus::Active => write!(f, "active"),
            LicenseStatus::Expired => write!(f, "expired"),
            LicenseStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for LicenseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordered" => Ok(LicenseStatus::Ordered),
            "active" => Ok(LicenseStatus::Active),
            "expired" => Ok(LicenseStatus::Expired),
            "cancelled" => Ok(LicenseStatus::Cancelled),
            _ => Err(format!("Invalid license status: {}", s)),
        }
    }
}

impl TryFrom<String> for LicenseStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

/// TermType distinguishes how a license term is sold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    Subscription,
    Perpetual,
    Maintenance,
}

impl std::fmt::Display for TermType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermType::Subscription => write!(f, "subscription"),
            TermType::Perpetual => write!(f, "perpetual"),
            TermType::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl FromStr for TermType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(TermType::Subscription),
            "perpetual" => Ok(TermType::Perpetual),
            "maintenance" => Ok(TermType::Maintenance),
            _ => Err(format!("Invalid term type: {}", s)),
        }
    }
}

impl TryFrom<String> for TermType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

// ============================================================================
// Read Projections
// ============================================================================

/// License row joined with customer and product names for API listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseWithNames {
    pub public_id: Uuid,
    pub customer_id: i64,
    pub product_id: i64,
    pub status: LicenseStatus,
    pub term_type: TermType,
    pub license_key: Option<String>,
    pub seats: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub auto_renew: bool,
    pub renewal_notes: Option<String>,
    pub po_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub product_name: String,
}

/// Projection the reminder engine works with: one license expiring on the
/// queried date, joined with what the notification templates need
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpiringLicense {
    pub license_id: i64,
    pub public_id: Uuid,
    pub end_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: LicenseStatus,
    pub license_key: Option<String>,
    pub seats: Option<i32>,
    pub customer_name: String,
    pub contact_email: Option<String>,
    pub product_name: String,
}

/// Dashboard projection: licenses ending within the lookahead window
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UpcomingLicense {
    pub public_id: Uuid,
    pub end_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: LicenseStatus,
    pub customer_name: String,
    pub product_name: String,
}

/// Calendar feed projection: every non-terminated license with an end date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalendarEntry {
    pub public_id: Uuid,
    pub end_date: NaiveDate,
    pub customer_name: String,
    pub product_name: String,
}

// ============================================================================
// Reminder Ledger Models
// ============================================================================

/// Channel a reminder was delivered over
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Slack,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Slack => write!(f, "slack"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "slack" => Ok(Channel::Slack),
            _ => Err(format!("Invalid channel: {}", s)),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

/// Ledger row joined with license identity for the operator-facing listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReminderLogEntry {
    pub id: i64,
    pub license_public_id: Uuid,
    pub customer_name: String,
    pub product_name: String,
    pub threshold: String,
    #[sqlx(try_from = "String")]
    pub channel: Channel,
    pub details: Option<String>,
    pub inserted_at: DateTime<Utc>,
}
