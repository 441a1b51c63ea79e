//! Contract bindings used by the transfer and redeem variants

pub mod ctoken;
pub mod erc20;

pub use ctoken::*;
pub use erc20::*;
