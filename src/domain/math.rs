//! Exact integer arithmetic over on-chain amounts.
//!
//! All quantities are EVM-style unsigned 256-bit integers. Share conversion
//! formulas use 512-bit intermediates so `a * b` cannot overflow before the
//! division, and division truncates, matching on-chain rounding.

use alloy_primitives::{U256, U512};

/// Truncating `(a * b) / denominator` computed in 512-bit space.
///
/// Returns zero when the denominator is zero; callers guard that case
/// explicitly where the formula defines different behavior.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    let wide = U512::from(a) * U512::from(b) / U512::from(denominator);
    // A quotient wider than 256 bits saturates.
    wide.saturating_to::<U256>()
}

/// `current - debit`, clamped at zero when the debit exceeds the balance.
pub fn clamped_sub(current: U256, debit: U256) -> U256 {
    if debit > current {
        U256::ZERO
    } else {
        current - debit
    }
}

/// `10^decimals`, the divisor converting share units to underlying units.
pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}
