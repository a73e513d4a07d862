//! Persisted records.

use crate::ledger::CallStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User account record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    /// Opaque identifier (provider-assigned on sync).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address, unique across users.
    pub email: String,
    /// OAuth provider (`google` or `apple`).
    pub provider: Option<String>,
    /// Subject identifier at the OAuth provider.
    pub provider_id: Option<String>,
    /// Avatar URL.
    pub picture: Option<String>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Named grouping of holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Portfolio {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Portfolio name.
    pub name: String,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Stock holding record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Stock {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Owning portfolio, if any.
    pub portfolio_id: Option<Uuid>,
    /// Ticker symbol.
    pub symbol: String,
    /// Cost basis per share.
    pub basis: f64,
    /// Share count (fractional shares allowed).
    pub shares: f64,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Covered call contract written against a holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CoveredCall {
    /// Unique identifier.
    pub id: Uuid,
    /// Holding the call is written against.
    pub stock_id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Portfolio of the holding at creation time.
    pub portfolio_id: Option<Uuid>,
    /// Strike price per share.
    pub strike_price: f64,
    /// Premium received per share.
    pub premium_received: f64,
    /// Number of contracts (100 shares each).
    pub contracts: i32,
    /// Expiration date.
    pub expiration_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: CallStatus,
    /// Date the call was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_date: Option<DateTime<Utc>>,
    /// Price the shares were called away at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_price: Option<f64>,
    /// Date the call was bought back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyback_date: Option<DateTime<Utc>>,
    /// Premium paid to buy the call back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyback_premium: Option<f64>,
    /// `premium_received * contracts * 100`, fixed at creation.
    pub total_premium: f64,
    /// `contracts * 100`, fixed at creation.
    pub shares_covered: i64,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_call(status: CallStatus) -> CoveredCall {
        let now = Utc::now();
        CoveredCall {
            id: Uuid::new_v4(),
            stock_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            portfolio_id: None,
            strike_price: 55.0,
            premium_received: 3.0,
            contracts: 2,
            expiration_date: now,
            status,
            assignment_date: None,
            assignment_price: None,
            buyback_date: None,
            buyback_premium: None,
            total_premium: 600.0,
            shares_covered: 200,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_covered_call_omits_empty_close_fields() {
        let call = sample_call(CallStatus::Active);
        let json = serde_json::to_string(&call).unwrap();
        assert!(json.contains("\"status\":\"active\""));
        assert!(!json.contains("assignment_price"));
        assert!(!json.contains("buyback_date"));
    }

    #[test]
    fn test_covered_call_keeps_close_fields_when_set() {
        let mut call = sample_call(CallStatus::BoughtBack);
        call.buyback_premium = Some(0.5);
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["status"], "bought_back");
        assert_eq!(json["buyback_premium"], 0.5);
    }
}
