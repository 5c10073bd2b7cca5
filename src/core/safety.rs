use spl_token::native_mint;

use crate::core::scanner::TokenHolding;

pub fn is_wrapped_sol(holding: &TokenHolding) -> bool {
    holding.mint == native_mint::id()
}

/// Whether a holding belongs in the transfer phase (`empty_only == false`) or
/// the close phase (`empty_only == true`). Wrapped SOL is left for the fee
/// payer and never drained.
pub fn is_drain_candidate(holding: &TokenHolding, empty_only: bool) -> bool {
    if is_wrapped_sol(holding) {
        return false;
    }

    if empty_only {
        holding.amount == 0
    } else {
        holding.amount > 0
    }
}

/// A phase is finished once a fresh scan finds nothing left to do.
pub fn phase_complete(holdings: &[TokenHolding]) -> bool {
    holdings.is_empty()
}
