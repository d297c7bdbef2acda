use tracing::debug;

use crate::FeeError;

/// Gas units consumed by one chunk submission.
pub const GAS_PER_CHUNK: u64 = 29_164_658;

/// Per-step growth ratio for the instant profile's projection — a
/// conservative upper bound for retry/front-running pressure at a fast
/// cadence, not a real escalating price.
const INSTANT_RATIO: f64 = 1.125;

/// Per-step growth ratio for the paced profile's projection; slower cadence
/// leaves time for fees to normalize.
const PACED_RATIO: f64 = 1.01;

/// Spot price endpoint for the local-currency conversion.
const SPOT_PRICE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=ethereum&vs_currencies=usd";

/// Pacing policy for chunk submissions. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacingProfile {
    /// Submit as fast as confirmations allow. Highest projected cost.
    Instant,
    /// One chunk per minute. Lowest cost without a hard cap.
    Paced,
    /// Only submit while the price sits at or below the given ceiling.
    /// Can be very slow.
    Capped { max_price_gwei: f64 },
}

impl PacingProfile {
    pub fn label(&self) -> &'static str {
        match self {
            PacingProfile::Instant => "instant",
            PacingProfile::Paced => "paced",
            PacingProfile::Capped { .. } => "capped",
        }
    }
}

/// Projected cost in the ledger's native currency and the local currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostFigure {
    pub native: f64,
    pub local: f64,
}

/// Per-profile cost projection, so a caller can compare before committing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub instant: CostFigure,
    pub paced: CostFigure,
    /// Present only when a custom ceiling price was supplied.
    pub capped: Option<CostFigure>,
}

impl CostEstimate {
    /// The figure for the given profile, if projected.
    pub fn for_profile(&self, profile: PacingProfile) -> Option<CostFigure> {
        match profile {
            PacingProfile::Instant => Some(self.instant),
            PacingProfile::Paced => Some(self.paced),
            PacingProfile::Capped { .. } => self.capped,
        }
    }
}

/// Projects total upload cost under each pacing profile.
///
/// Pure function of the inputs; advisory only, used for the confirmation
/// step. When `custom_price_gwei` is given it replaces the base price for
/// every profile, and the capped figure (flat, no growth — the gate
/// guarantees the ceiling is never exceeded) is included.
pub fn project_costs(
    chunk_count: u32,
    base_price_wei: u128,
    native_price_local: f64,
    custom_price_gwei: Option<f64>,
) -> CostEstimate {
    let price_wei = match custom_price_gwei {
        Some(gwei) => chainvid_rpc::gwei_to_wei(gwei),
        None => base_price_wei,
    };
    let per_chunk_wei = GAS_PER_CHUNK as f64 * price_wei as f64;

    let mut instant_wei = 0.0;
    let mut paced_wei = 0.0;
    let mut capped_wei = 0.0;
    for i in 0..chunk_count {
        instant_wei += per_chunk_wei * INSTANT_RATIO.powi(i as i32);
        paced_wei += per_chunk_wei * PACED_RATIO.powi(i as i32);
        capped_wei += per_chunk_wei;
    }

    let figure = |wei: f64| {
        // Sub-wei precision from the growth curves is noise; truncate.
        let native = chainvid_rpc::wei_to_ether(wei as u128);
        CostFigure {
            native,
            local: native * native_price_local,
        }
    };

    debug!(chunk_count, price_wei, "costs projected");
    CostEstimate {
        instant: figure(instant_wei),
        paced: figure(paced_wei),
        capped: custom_price_gwei.map(|_| figure(capped_wei)),
    }
}

/// Fetches the native asset's spot price in the local currency.
pub async fn fetch_native_price(http: &reqwest::Client) -> Result<f64, FeeError> {
    let body: serde_json::Value = http.get(SPOT_PRICE_URL).send().await?.json().await?;
    body.get("ethereum")
        .and_then(|v| v.get("usd"))
        .and_then(|v| v.as_f64())
        .ok_or(FeeError::MissingField("ethereum.usd"))
}
