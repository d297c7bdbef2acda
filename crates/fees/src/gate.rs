use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::{FeeError, FeeSample, FeeSource, poll_until};

/// Backoff between fee checks while a signal sits above its ceiling.
/// Long enough not to hammer a public endpoint while a spike resolves.
pub const FEE_BACKOFF: Duration = Duration::from_secs(600);

/// Re-check interval for the capped-profile price loop.
pub const PRICE_RECHECK: Duration = Duration::from_secs(60);

/// Margin added to the base fee when pricing a submission. Small enough not
/// to overpay materially, large enough to avoid underpriced stuck
/// transactions.
const PRICE_MARGIN_PERCENT: u128 = 4;

/// Operator-configured ceilings for the two fee signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeLimits {
    pub settlement_ceiling_gwei: f64,
    pub publication_ceiling_gwei: f64,
}

/// Admission gate over a [`FeeSource`].
///
/// `wait_until_affordable` runs before every chunk submission, not just
/// once. Sampling failures inside the gate are expected, recoverable noise
/// and are retried on the same backoff.
pub struct FeeGate {
    source: Arc<dyn FeeSource>,
    limits: FeeLimits,
}

impl FeeGate {
    pub fn new(source: Arc<dyn FeeSource>, limits: FeeLimits) -> Self {
        Self { source, limits }
    }

    pub fn limits(&self) -> FeeLimits {
        self.limits
    }

    /// Takes one joint reading of both fee signals.
    pub async fn sample(&self) -> Result<FeeSample, FeeError> {
        let settlement_fee_gwei = self.source.settlement_fee_gwei().await?;
        let publication_fee_gwei = self.source.publication_fee_gwei().await?;
        Ok(FeeSample {
            settlement_fee_gwei,
            publication_fee_gwei,
            sampled_at: Utc::now(),
        })
    }

    /// Blocks until both fee signals are at or below their ceilings.
    ///
    /// Returns on the first sample that passes; sleeps [`FEE_BACKOFF`]
    /// between failing or erroring samples.
    pub async fn wait_until_affordable(&self) {
        poll_until(FEE_BACKOFF, || async move {
            match self.source.settlement_fee_gwei().await {
                Ok(gwei) if gwei > self.limits.settlement_ceiling_gwei => {
                    info!(
                        gwei,
                        ceiling = self.limits.settlement_ceiling_gwei,
                        "settlement fee above ceiling, waiting"
                    );
                    return None;
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "settlement fee sample failed, retrying");
                    return None;
                }
            }

            match self.source.publication_fee_gwei().await {
                Ok(gwei) if gwei > self.limits.publication_ceiling_gwei => {
                    info!(
                        gwei,
                        ceiling = self.limits.publication_ceiling_gwei,
                        "publication fee above ceiling, waiting"
                    );
                    None
                }
                Ok(_) => Some(()),
                Err(error) => {
                    warn!(%error, "publication fee sample failed, retrying");
                    None
                }
            }
        })
        .await
    }

    /// Price to pay for the next submission: base fee plus the margin.
    pub async fn gas_price(&self) -> Result<u128, FeeError> {
        let base = self.source.base_fee_wei().await?;
        Ok(base + base * PRICE_MARGIN_PERCENT / 100)
    }

    /// Blocks until the priced submission cost is at or below
    /// `ceiling_gwei`, re-checking every [`PRICE_RECHECK`]. Returns the
    /// price that passed.
    pub async fn wait_for_price_at_most(&self, ceiling_gwei: f64) -> u128 {
        let ceiling_wei = chainvid_rpc::gwei_to_wei(ceiling_gwei);
        poll_until(PRICE_RECHECK, || async move {
            match self.gas_price().await {
                Ok(price) if price <= ceiling_wei => Some(price),
                Ok(price) => {
                    info!(
                        gwei = chainvid_rpc::wei_to_gwei(price),
                        ceiling_gwei, "price above cap, waiting"
                    );
                    None
                }
                Err(error) => {
                    warn!(%error, "price sample failed, retrying");
                    None
                }
            }
        })
        .await
    }
}
