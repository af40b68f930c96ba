//! Even prize splits that conserve every cent.

use crate::domain::{Money, PayoutShare, UserId};

/// Split `prize` evenly across `recipients`, given in join order.
///
/// Each share is floored to whole cents first; leftover cents are then
/// handed out one at a time starting from the earliest joiner, and any
/// sub-cent residue also lands on the earliest joiner. The shares always
/// sum to exactly `prize`.
pub fn split_even(prize: Money, recipients: &[UserId]) -> Vec<PayoutShare> {
    if recipients.is_empty() {
        return Vec::new();
    }

    let count = Money::from(recipients.len() as i64);
    let base = (prize / count).floor_cents();

    let mut shares: Vec<PayoutShare> = recipients
        .iter()
        .map(|user_id| PayoutShare {
            user_id: user_id.clone(),
            amount: base,
        })
        .collect();

    let mut residual = prize - base * count;
    let cent = Money::cent();
    let mut idx = 0;
    while residual >= cent && idx < shares.len() {
        shares[idx].amount = shares[idx].amount + cent;
        residual = residual - cent;
        idx += 1;
    }
    if !residual.is_zero() {
        shares[0].amount = shares[0].amount + residual;
    }

    shares
}
