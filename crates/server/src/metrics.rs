//! Prometheus metrics for the faucet.
//!
//! All metrics are aggregated in the [`Metrics`] struct. Recording is a no-op
//! until a recorder (the Prometheus exporter) is installed.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Aggregated metrics for the faucet.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Request metrics
        describe_counter!(
            "faucet_claims_total",
            "Total funding requests by route and outcome"
        );
        describe_counter!(
            "faucet_rate_limited_total",
            "Total requests rejected by the rate limiter, by route"
        );
        describe_counter!(
            "faucet_kyc_requests_total",
            "Total KYC data requests sent, by result"
        );

        // Transfer metrics
        describe_counter!(
            "faucet_transfers_total",
            "Total transfers sent, by kind and result"
        );
        describe_histogram!(
            "faucet_funding_duration_seconds",
            "Time to submit both transfers of a payout"
        );

        // Queue metrics
        describe_gauge!(
            "faucet_queue_depth",
            "Recipients waiting to be funded"
        );

        // Balance metrics (gauges - current values)
        describe_gauge!(
            "faucet_native_balance_wei",
            "Current native balance of the faucet account in wei"
        );
        describe_gauge!(
            "faucet_token_balance_wei",
            "Current core token balance of the faucet account in wei"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Request metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record the outcome of a funding request.
    pub fn record_claim(&self, route: &'static str, outcome: &'static str) {
        counter!("faucet_claims_total", "route" => route, "outcome" => outcome).increment(1);
    }

    pub fn record_rate_limited(&self, route: &'static str) {
        counter!("faucet_rate_limited_total", "route" => route).increment(1);
    }

    pub fn record_kyc_request(&self, success: bool) {
        let result = if success { "success" } else { "failure" };
        counter!("faucet_kyc_requests_total", "result" => result).increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transfer metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a single transfer; `kind` is `native` or `token`.
    pub fn record_transfer(&self, kind: &'static str, success: bool) {
        let result = if success { "success" } else { "failure" };
        counter!("faucet_transfers_total", "kind" => kind, "result" => result).increment(1);
    }

    pub fn record_funding_duration(&self, duration: Duration) {
        histogram!("faucet_funding_duration_seconds").record(duration.as_secs_f64());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Gauges
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_queue_depth(&self, depth: usize) {
        gauge!("faucet_queue_depth").set(depth as f64);
    }

    /// Set the current native balance.
    pub fn set_native_balance(&self, balance_wei: u128) {
        gauge!("faucet_native_balance_wei").set(balance_wei as f64);
    }

    /// Set the current core token balance.
    pub fn set_token_balance(&self, balance_wei: u128) {
        gauge!("faucet_token_balance_wei").set(balance_wei as f64);
    }
}
