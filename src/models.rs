//! Request and response models for the REST API.

use crate::db::{CoveredCall, Portfolio, Stock, User};
use crate::ledger::{CallStatus, StockMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Storage backend in use (`postgres` or `memory`).
    pub storage: String,
}

/// Generic confirmation message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable result.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Profile pushed by the identity provider after it verified the user.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SyncUserRequest {
    /// User id assigned by the identity provider.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// OAuth sign-in request.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OAuthRequest {
    /// Subject identifier at the provider.
    #[serde(rename = "providerId")]
    pub provider_id: String,
    /// Provider name: `google` or `apple`.
    pub provider: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
}

/// Identity carried in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    /// User id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session issued after a sync.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Signed bearer token.
    pub token: String,
    /// Expiry as a unix timestamp in seconds.
    pub expires: i64,
    /// Authenticated user.
    pub user: SessionUser,
}

/// Result of an OAuth sign-in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthResponse {
    /// User id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub picture: Option<String>,
    /// Whether the account was created by this sign-in.
    #[serde(rename = "isNewUser")]
    pub is_new_user: bool,
    /// Signed bearer token.
    pub token: String,
    /// Expiry as a unix timestamp in seconds.
    pub expires: i64,
}

// ============================================================================
// Portfolios
// ============================================================================

/// Request to create a portfolio.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePortfolioRequest {
    /// Portfolio name.
    pub name: String,
}

/// Partial portfolio update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdatePortfolioRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Portfolio with its holdings.
#[derive(Debug, Serialize, ToSchema)]
pub struct PortfolioResponse {
    /// Portfolio record.
    #[serde(flatten)]
    pub portfolio: Portfolio,
    /// Holdings in the portfolio with their metrics.
    pub stocks: Vec<StockResponse>,
}

// ============================================================================
// Stocks
// ============================================================================

/// Request to add a stock holding.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateStockRequest {
    /// Portfolio to file the holding under.
    #[serde(default)]
    pub portfolio_id: Option<Uuid>,
    /// Ticker symbol.
    pub symbol: String,
    /// Cost basis per share.
    pub basis: f64,
    /// Share count.
    pub shares: f64,
}

/// Partial stock update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateStockRequest {
    /// New share count.
    #[serde(default)]
    pub shares: Option<f64>,
    /// New cost basis per share.
    #[serde(default)]
    pub basis: Option<f64>,
}

/// Holding with its covered calls and derived metrics.
#[derive(Debug, Serialize, ToSchema)]
pub struct StockResponse {
    /// Stock record.
    #[serde(flatten)]
    pub stock: Stock,
    /// Metrics computed from `covered_calls`.
    #[serde(flatten)]
    pub metrics: StockMetrics,
    /// Covered calls written against the holding, newest first.
    pub covered_calls: Vec<CoveredCall>,
}

// ============================================================================
// Covered Calls
// ============================================================================

/// Contract terms of a covered call.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CoveredCallTerms {
    /// Strike price per share.
    pub strike_price: f64,
    /// Premium received per share.
    pub premium_received: f64,
    /// Number of contracts.
    pub contracts: i32,
    /// Expiration date.
    pub expiration_date: DateTime<Utc>,
}

/// Request to write a covered call against a holding named in the body.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateCoveredCallRequest {
    /// Holding to cover.
    pub stock_id: Uuid,
    /// Contract terms.
    #[serde(flatten)]
    pub terms: CoveredCallTerms,
}

/// Partial covered call update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateCoveredCallRequest {
    /// New status; must follow the transition table.
    #[serde(default)]
    pub status: Option<CallStatus>,
    /// Assignment date.
    #[serde(default)]
    pub assignment_date: Option<DateTime<Utc>>,
    /// Assignment price per share.
    #[serde(default)]
    pub assignment_price: Option<f64>,
    /// Buyback date.
    #[serde(default)]
    pub buyback_date: Option<DateTime<Utc>>,
    /// Premium paid to buy back, per share.
    #[serde(default)]
    pub buyback_premium: Option<f64>,
}

/// Covered call with the symbol of its holding.
#[derive(Debug, Serialize, ToSchema)]
pub struct CoveredCallResponse {
    /// Covered call record.
    #[serde(flatten)]
    pub call: CoveredCall,
    /// Ticker symbol of the covered holding.
    pub symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_request_uses_camel_case_provider_id() {
        let json = r#"{"providerId":"g-123","provider":"google","email":"a@b.c","name":"A"}"#;
        let req: OAuthRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.provider_id, "g-123");
        assert!(req.picture.is_none());
    }

    #[test]
    fn test_oauth_response_is_new_user_field() {
        let response = OAuthResponse {
            id: "u".to_string(),
            email: "a@b.c".to_string(),
            name: "A".to_string(),
            picture: None,
            is_new_user: true,
            token: "t".to_string(),
            expires: 1,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"isNewUser\":true"));
    }

    #[test]
    fn test_create_covered_call_request_flattens_terms() {
        let json = r#"{
            "stock_id": "6f1c1e0e-2f0a-4d51-9a3e-6a1b2c3d4e5f",
            "strike_price": 55.0,
            "premium_received": 1.25,
            "contracts": 3,
            "expiration_date": "2025-06-20T00:00:00Z"
        }"#;
        let req: CreateCoveredCallRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.terms.contracts, 3);
        assert_eq!(req.terms.premium_received, 1.25);
    }

    #[test]
    fn test_update_covered_call_request_parses_status() {
        let req: UpdateCoveredCallRequest =
            serde_json::from_str(r#"{"status":"bought_back","buyback_premium":0.4}"#).unwrap();
        assert_eq!(req.status, Some(CallStatus::BoughtBack));
        assert_eq!(req.buyback_premium, Some(0.4));
        assert!(req.assignment_date.is_none());
    }

    #[test]
    fn test_update_covered_call_request_rejects_unknown_status() {
        let result: Result<UpdateCoveredCallRequest, _> =
            serde_json::from_str(r#"{"status":"closed"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_stock_request_rejects_non_numeric_shares() {
        let result: Result<UpdateStockRequest, _> = serde_json::from_str(r#"{"shares":"ten"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_response() {
        let json = serde_json::to_string(&MessageResponse::new("Stock deleted successfully"))
            .unwrap();
        assert_eq!(json, r#"{"message":"Stock deleted successfully"}"#);
    }
}
