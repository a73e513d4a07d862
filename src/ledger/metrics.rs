//! Read-time metrics for a holding and its covered calls.

use super::CallStatus;
use crate::db::{CoveredCall, Stock};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shares per option contract.
pub const SHARES_PER_CONTRACT: i64 = 100;

/// Derived figures for a holding. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct StockMetrics {
    /// Cost basis per share net of all premium collected.
    pub adjusted_basis: f64,
    /// Premium collected across every call, whatever its status.
    pub total_premium: f64,
    /// Number of active calls.
    pub active_calls: u32,
    /// Shares committed to active calls.
    pub shares_covered: i64,
    /// Whole shares still free to cover new calls.
    pub shares_available: i64,
}

impl StockMetrics {
    /// Computes metrics for `stock` from its loaded covered calls.
    ///
    /// Premium counts every call; coverage counts active calls only. With zero
    /// shares there is nothing to spread the premium over and the adjusted
    /// basis equals the basis.
    #[must_use]
    pub fn calculate(stock: &Stock, calls: &[CoveredCall]) -> Self {
        let mut total_premium = 0.0;
        let mut active_calls = 0;
        let mut shares_covered = 0;

        for call in calls {
            total_premium += call.total_premium;
            if call.status == CallStatus::Active {
                active_calls += 1;
                shares_covered += call.shares_covered;
            }
        }

        let adjusted_basis = if stock.shares > 0.0 {
            stock.basis - total_premium / stock.shares
        } else {
            stock.basis
        };

        Self {
            adjusted_basis,
            total_premium,
            active_calls,
            shares_covered,
            shares_available: stock.shares.trunc() as i64 - shares_covered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn holding(shares: f64, basis: f64) -> Stock {
        let now = Utc::now();
        Stock {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            portfolio_id: None,
            symbol: "KO".to_string(),
            basis,
            shares,
            created_at: now,
            updated_at: now,
        }
    }

    fn call(stock: &Stock, contracts: i32, premium: f64, status: CallStatus) -> CoveredCall {
        let now = Utc::now();
        CoveredCall {
            id: Uuid::new_v4(),
            stock_id: stock.id,
            user_id: stock.user_id.clone(),
            portfolio_id: None,
            strike_price: 60.0,
            premium_received: premium,
            contracts,
            expiration_date: now,
            status,
            assignment_date: None,
            assignment_price: None,
            buyback_date: None,
            buyback_premium: None,
            total_premium: premium * f64::from(contracts) * 100.0,
            shares_covered: i64::from(contracts) * SHARES_PER_CONTRACT,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_single_active_call_scenario() {
        let stock = holding(300.0, 50.0);
        let calls = vec![call(&stock, 2, 3.0, CallStatus::Active)];

        let metrics = StockMetrics::calculate(&stock, &calls);
        assert_eq!(metrics.total_premium, 600.0);
        assert_eq!(metrics.active_calls, 1);
        assert_eq!(metrics.shares_covered, 200);
        assert_eq!(metrics.shares_available, 100);
        assert_eq!(metrics.adjusted_basis, 48.0);
    }

    #[test]
    fn test_no_calls_yields_zero_metrics() {
        let stock = holding(100.0, 25.0);
        let metrics = StockMetrics::calculate(&stock, &[]);

        assert_eq!(metrics.total_premium, 0.0);
        assert_eq!(metrics.active_calls, 0);
        assert_eq!(metrics.shares_covered, 0);
        assert_eq!(metrics.shares_available, 100);
        assert_eq!(metrics.adjusted_basis, 25.0);
    }

    #[test]
    fn test_premium_counts_every_status_coverage_only_active() {
        let stock = holding(1000.0, 40.0);
        let calls = vec![
            call(&stock, 1, 1.0, CallStatus::Pending),
            call(&stock, 2, 1.0, CallStatus::Active),
            call(&stock, 3, 1.0, CallStatus::Active),
            call(&stock, 1, 1.0, CallStatus::Expired),
            call(&stock, 1, 1.0, CallStatus::Assigned),
            call(&stock, 1, 1.0, CallStatus::BoughtBack),
        ];

        let metrics = StockMetrics::calculate(&stock, &calls);
        assert_eq!(metrics.total_premium, 900.0);
        assert_eq!(metrics.active_calls, 2);
        assert_eq!(metrics.shares_covered, 500);
        assert_eq!(metrics.shares_available, 500);
        assert!((metrics.adjusted_basis - 39.1).abs() < 1e-9);
    }

    #[test]
    fn test_order_independent() {
        let stock = holding(800.0, 10.0);
        let mut calls = vec![
            call(&stock, 1, 0.5, CallStatus::Active),
            call(&stock, 2, 0.7, CallStatus::Pending),
            call(&stock, 3, 0.9, CallStatus::Active),
            call(&stock, 1, 1.1, CallStatus::Expired),
        ];

        let forward = StockMetrics::calculate(&stock, &calls);
        calls.reverse();
        let backward = StockMetrics::calculate(&stock, &calls);
        calls.swap(0, 2);
        let shuffled = StockMetrics::calculate(&stock, &calls);

        for other in [backward, shuffled] {
            assert_eq!(forward.active_calls, other.active_calls);
            assert_eq!(forward.shares_covered, other.shares_covered);
            assert!((forward.total_premium - other.total_premium).abs() < 1e-9);
        }
        assert_eq!(forward.active_calls, 2);
        assert_eq!(forward.shares_covered, 400);
    }

    #[test]
    fn test_zero_shares_keeps_basis() {
        let stock = holding(0.0, 12.5);
        let calls = vec![call(&stock, 1, 2.0, CallStatus::Expired)];

        let metrics = StockMetrics::calculate(&stock, &calls);
        assert_eq!(metrics.total_premium, 200.0);
        assert_eq!(metrics.adjusted_basis, 12.5);
        assert!(metrics.adjusted_basis.is_finite());
    }

    #[test]
    fn test_fractional_shares_truncate_for_availability() {
        let stock = holding(250.75, 20.0);
        let calls = vec![call(&stock, 2, 1.0, CallStatus::Active)];

        let metrics = StockMetrics::calculate(&stock, &calls);
        assert_eq!(metrics.shares_available, 50);
    }
}
