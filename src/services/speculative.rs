//! Decrement-then-validate for quantity-bounded resources.
//!
//! Instead of reading a counter, checking it and then writing it back (a
//! check-then-act race), every claim is subtracted unconditionally by the
//! resource itself and the remaining amount is inspected afterwards. A claim
//! that leaves the counter below zero oversold it. The caller runs this inside
//! an atomic unit of work and discards the whole unit when
//! [`SpeculativeError::Oversold`] comes back.

use std::future::Future;

use thiserror::Error;

/// A counter that can be decremented atomically by whoever owns it.
pub trait QuantityBounded {
    type Key;
    type Error;

    /// Subtracts `quantity` without checking it first and returns what is left.
    /// The result may be negative.
    fn decrement(
        &mut self,
        key: &Self::Key,
        quantity: i32,
    ) -> impl Future<Output = Result<i32, Self::Error>> + Send;
}

/// A request to take `quantity` units from the counter behind `key`.
/// `tag` identifies the claim in error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim<T, K> {
    pub tag: T,
    pub key: K,
    pub quantity: i32,
}

/// A claim that drove its counter negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall<T> {
    pub tag: T,
    pub requested: i32,
    /// Amount the counter held right before this claim was applied.
    pub available: i32,
}

#[derive(Debug, Error)]
pub enum SpeculativeError<T, E> {
    #[error("{} claim(s) exceeded the available quantity", .0.len())]
    Oversold(Vec<Shortfall<T>>),

    #[error("{0}")]
    Resource(E),
}

/// Applies every claim in order, then reports all claims that oversold.
///
/// Decrements that looked fine are *not* undone here; rolling them back is the
/// job of the surrounding unit of work.
pub async fn decrement_then_validate<R, T>(
    resource: &mut R,
    claims: Vec<Claim<T, R::Key>>,
) -> Result<(), SpeculativeError<T, R::Error>>
where
    R: QuantityBounded,
{
    let mut shortfalls = Vec::new();

    for claim in claims {
        let remaining = resource
            .decrement(&claim.key, claim.quantity)
            .await
            .map_err(SpeculativeError::Resource)?;

        if remaining < 0 {
            shortfalls.push(Shortfall {
                tag: claim.tag,
                requested: claim.quantity,
                available: remaining + claim.quantity,
            });
        }
    }

    if shortfalls.is_empty() {
        Ok(())
    } else {
        Err(SpeculativeError::Oversold(shortfalls))
    }
}
