//! Fee oracle, admission gate, and cost estimation.
//!
//! Ledger writes are only issued when both real-time fee signals (the
//! settlement-layer gas price and the data-publication fee) sit at or below
//! their configured ceilings. The gate re-checks before every chunk, since
//! fee conditions change materially over a multi-hour upload.

mod estimate;
mod gate;
mod poll;
mod source;

pub use estimate::{
    CostEstimate, CostFigure, GAS_PER_CHUNK, PacingProfile, fetch_native_price, project_costs,
};
pub use gate::{FeeGate, FeeLimits};
pub use poll::poll_until;
pub use source::{FeeSample, FeeSource, RpcFeeSource};

/// Errors from fee feeds and price calculation.
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] chainvid_rpc::EnvelopeError),

    #[error("bad quantity: {0}")]
    Quantity(#[from] chainvid_rpc::QuantityError),

    #[error("response missing field: {0}")]
    MissingField(&'static str),
}
