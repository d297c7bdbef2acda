//! JSON-RPC 2.0 envelope types and on-chain quantity helpers.
//!
//! Shared by the fee oracle and the ledger client so both speak the same
//! wire format without dragging in a full chain SDK.

mod envelope;
mod units;

pub use envelope::{EnvelopeError, Request, Response, RpcErrorBody};
pub use units::{
    QuantityError, WEI_PER_ETHER, WEI_PER_GWEI, format_quantity, gwei_to_wei, parse_quantity,
    wei_to_ether, wei_to_gwei,
};
