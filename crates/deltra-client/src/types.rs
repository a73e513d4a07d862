//! Request and response types for the Deltra API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;


/// Lifecycle status of a covered call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Recorded, not yet open.
    Pending,
    /// Open; its contracts cover shares.
    Active,
    /// Expired worthless.
    Expired,
    /// Shares were called away.
    Assigned,
    /// Closed by buying the contracts back.
    BoughtBack,
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Assigned => write!(f, "assigned"),
            Self::BoughtBack => write!(f, "bought_back"),
        }
    }
}

// ============================================================================
// Health & Errors
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Storage backend in use.
    pub storage: String,
}

/// Generic confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable result.
    pub message: String,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
}

// ============================================================================
// Authentication & Users
// ============================================================================

/// Sync request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncUserRequest {
    /// User id assigned by the identity provider.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// OAuth sign-in request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthRequest {
    /// Subject identifier at the provider.
    #[serde(rename = "providerId")]
    pub provider_id: String,
    /// `google` or `apple`.
    pub provider: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Identity carried in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Session issued after a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token.
    pub token: String,
    /// Expiry as unix seconds.
    pub expires: i64,
    /// Authenticated user.
    pub user: SessionUser,
}

/// Result of an OAuth sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthResponse {
    /// User id.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub picture: Option<String>,
    /// Whether this sign-in created the account.
    #[serde(rename = "isNewUser")]
    pub is_new_user: bool,
    /// Bearer token.
    pub token: String,
    /// Expiry as unix seconds.
    pub expires: i64,
}

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// OAuth provider, when signed in through one.
    #[serde(default)]
    pub provider: Option<String>,
    /// Subject identifier at the provider.
    #[serde(default)]
    pub provider_id: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Portfolios
// ============================================================================

/// Portfolio record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// Portfolio id.
    pub id: Uuid,
    /// Owner.
    pub user_id: String,
    /// Name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Portfolio with its holdings.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioResponse {
    /// Portfolio record.
    #[serde(flatten)]
    pub portfolio: Portfolio,
    /// Holdings with metrics.
    pub stocks: Vec<StockResponse>,
}

/// Create portfolio request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePortfolioRequest {
    /// Name.
    pub name: String,
}

/// Update portfolio request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePortfolioRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ============================================================================
// Stocks
// ============================================================================

/// Stock holding record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    /// Stock id.
    pub id: Uuid,
    /// Owner.
    pub user_id: String,
    /// Portfolio the holding is filed under.
    #[serde(default)]
    pub portfolio_id: Option<Uuid>,
    /// Ticker symbol.
    pub symbol: String,
    /// Cost basis per share.
    pub basis: f64,
    /// Share count.
    pub shares: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Derived figures for a holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockMetrics {
    /// Basis net of all premium collected.
    pub adjusted_basis: f64,
    /// Premium collected across every call.
    pub total_premium: f64,
    /// Number of active calls.
    pub active_calls: u32,
    /// Shares committed to active calls.
    pub shares_covered: i64,
    /// Whole shares still free.
    pub shares_available: i64,
}

/// Holding with covered calls and metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct StockResponse {
    /// Stock record.
    #[serde(flatten)]
    pub stock: Stock,
    /// Derived metrics.
    #[serde(flatten)]
    pub metrics: StockMetrics,
    /// Covered calls, newest first.
    pub covered_calls: Vec<CoveredCall>,
}

/// Create stock request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStockRequest {
    /// Portfolio to file the holding under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<Uuid>,
    /// Ticker symbol.
    pub symbol: String,
    /// Cost basis per share.
    pub basis: f64,
    /// Share count.
    pub shares: f64,
}

/// Update stock request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStockRequest {
    /// New share count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<f64>,
    /// New basis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basis: Option<f64>,
}

// ============================================================================
// Covered Calls
// ============================================================================

/// Covered call record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveredCall {
    /// Call id.
    pub id: Uuid,
    /// Covered holding.
    pub stock_id: Uuid,
    /// Owner.
    pub user_id: String,
    /// Portfolio of the holding at write time.
    #[serde(default)]
    pub portfolio_id: Option<Uuid>,
    /// Strike price per share.
    pub strike_price: f64,
    /// Premium received per share.
    pub premium_received: f64,
    /// Number of contracts.
    pub contracts: i32,
    /// Expiration date.
    pub expiration_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: CallStatus,
    /// Assignment date.
    #[serde(default)]
    pub assignment_date: Option<DateTime<Utc>>,
    /// Assignment price per share.
    #[serde(default)]
    pub assignment_price: Option<f64>,
    /// Buyback date.
    #[serde(default)]
    pub buyback_date: Option<DateTime<Utc>>,
    /// Buyback premium per share.
    #[serde(default)]
    pub buyback_premium: Option<f64>,
    /// Premium for the whole position.
    pub total_premium: f64,
    /// Shares the contracts cover.
    pub shares_covered: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Covered call with its holding's symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct CoveredCallResponse {
    /// Call record.
    #[serde(flatten)]
    pub call: CoveredCall,
    /// Ticker symbol.
    pub symbol: String,
}

/// Contract terms of a new covered call.
#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// Create covered call request with the holding in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCoveredCallRequest {
    /// Holding to cover.
    pub stock_id: Uuid,
    /// Contract terms.
    #[serde(flatten)]
    pub terms: CoveredCallTerms,
}

/// Update covered call request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCoveredCallRequest {
    /// New status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CallStatus>,
    /// Assignment date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_date: Option<DateTime<Utc>>,
    /// Assignment price per share.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_price: Option<f64>,
    /// Buyback date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyback_date: Option<DateTime<Utc>>,
    /// Buyback premium per share.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyback_premium: Option<f64>,
}
