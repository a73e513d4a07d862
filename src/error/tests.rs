//! Unit tests for error module.

use super::*;

// ============================================================================
// ErrorResponse Tests
// ============================================================================

#[test]
fn test_error_response_serialization() {
    let response = ErrorResponse {
        error: "Something went wrong".to_string(),
        code: "INTERNAL_ERROR".to_string(),
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"error\":\"Something went wrong\""));
    assert!(json.contains("\"code\":\"INTERNAL_ERROR\""));
}

// ============================================================================
// ApiError Display Tests
// ============================================================================

#[test]
fn test_api_error_not_found_display() {
    let error = ApiError::NotFound("Stock not found".to_string());
    assert_eq!(format!("{}", error), "Stock not found");
}

#[test]
fn test_api_error_invalid_request_display() {
    let error = ApiError::InvalidRequest("Insufficient shares to cover the call".to_string());
    assert_eq!(
        format!("{}", error),
        "Invalid request: Insufficient shares to cover the call"
    );
}

#[test]
fn test_api_error_unauthorized_display() {
    let error = ApiError::Unauthorized("Invalid token".to_string());
    assert_eq!(format!("{}", error), "Unauthorized: Invalid token");
}

#[test]
fn test_api_error_internal_display() {
    let error = ApiError::Internal("connection reset".to_string());
    assert_eq!(
        format!("{}", error),
        "Internal server error: connection reset"
    );
}

#[test]
fn test_api_error_database_display() {
    let error = ApiError::Database("pool timed out".to_string());
    assert_eq!(format!("{}", error), "Database error: pool timed out");
}

// ============================================================================
// IntoResponse Tests
// ============================================================================

#[test]
fn test_not_found_status() {
    let response = ApiError::NotFound("x".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ledger_not_found_body_names_resource_once() {
    let error = ApiError::from(LedgerError::NotFound("Stock not found".to_string()));
    let bytes = axum::body::to_bytes(error.into_response().into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Stock not found");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[test]
fn test_invalid_request_status() {
    let response = ApiError::InvalidRequest("x".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_unauthorized_status() {
    let response = ApiError::Unauthorized("x".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_internal_and_database_status() {
    let internal = ApiError::Internal("x".to_string()).into_response();
    let database = ApiError::Database("x".to_string()).into_response();
    assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(database.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Conversion Tests
// ============================================================================

#[test]
fn test_ledger_not_found_maps_to_404() {
    let error: ApiError = LedgerError::NotFound("Covered call not found".to_string()).into();
    assert!(matches!(error, ApiError::NotFound(ref m) if m == "Covered call not found"));
}

#[test]
fn test_ledger_validation_maps_to_400() {
    let error: ApiError =
        LedgerError::Validation("Only pending calls can be activated".to_string()).into();
    assert!(matches!(error, ApiError::InvalidRequest(_)));
}

#[test]
fn test_ledger_internal_maps_to_500() {
    let error: ApiError = LedgerError::Internal("boom".to_string()).into();
    assert!(matches!(error, ApiError::Internal(_)));
}

#[test]
fn test_sqlx_error_maps_to_database() {
    let error: ApiError = sqlx::Error::RowNotFound.into();
    assert!(matches!(error, ApiError::Database(_)));
}

#[test]
fn test_invalid_session_maps_to_401() {
    let error: ApiError = SessionError::Invalid("ExpiredSignature".to_string()).into();
    assert!(matches!(error, ApiError::Unauthorized(_)));
    assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);
}
