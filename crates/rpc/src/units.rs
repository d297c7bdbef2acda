//! Hex quantity parsing and wei/gwei/ether conversions.
//!
//! Quantities on the wire are `0x`-prefixed big-endian hex with no leading
//! zeros, per the Ethereum JSON-RPC convention.

/// Wei per gwei.
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Wei per ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Error returned for malformed hex quantities.
#[derive(Debug, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity missing 0x prefix: {0:?}")]
    MissingPrefix(String),

    #[error("quantity is not valid hex: {0:?}")]
    InvalidHex(String),
}

/// Parses a `0x`-prefixed hex quantity into wei.
pub fn parse_quantity(s: &str) -> Result<u128, QuantityError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| QuantityError::MissingPrefix(s.to_string()))?;
    if digits.is_empty() {
        return Err(QuantityError::InvalidHex(s.to_string()));
    }
    u128::from_str_radix(digits, 16).map_err(|_| QuantityError::InvalidHex(s.to_string()))
}

/// Formats a quantity as `0x`-prefixed hex without leading zeros.
pub fn format_quantity(value: u128) -> String {
    format!("{value:#x}")
}

/// Converts wei to gwei as a float (for display and ceiling comparisons).
pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / WEI_PER_GWEI as f64
}

/// Converts a gwei amount to wei, truncating sub-wei precision.
pub fn gwei_to_wei(gwei: f64) -> u128 {
    (gwei * WEI_PER_GWEI as f64) as u128
}

/// Converts wei to ether as a float (for cost display only).
pub fn wei_to_ether(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETHER as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x1f4").unwrap(), 500);
        assert_eq!(parse_quantity("0x3b9aca00").unwrap(), WEI_PER_GWEI);
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!(matches!(
            parse_quantity("1f4").unwrap_err(),
            QuantityError::MissingPrefix(_)
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_quantity("0xzz").unwrap_err(),
            QuantityError::InvalidHex(_)
        ));
        assert!(matches!(
            parse_quantity("0x").unwrap_err(),
            QuantityError::InvalidHex(_)
        ));
    }

    #[test]
    fn format_roundtrip() {
        for v in [0u128, 1, 500, WEI_PER_GWEI, WEI_PER_ETHER, u128::MAX] {
            assert_eq!(parse_quantity(&format_quantity(v)).unwrap(), v);
        }
    }

    #[test]
    fn conversions() {
        assert_eq!(wei_to_gwei(WEI_PER_GWEI), 1.0);
        assert_eq!(wei_to_gwei(1_500_000_000), 1.5);
        assert_eq!(gwei_to_wei(2.5), 2_500_000_000);
        assert_eq!(wei_to_ether(WEI_PER_ETHER), 1.0);
    }
}
