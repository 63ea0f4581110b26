//! Cart-to-checkout inventory consistency core.

pub mod cart;
pub mod checkout;
pub mod error;
pub mod speculative;
pub mod validation;
