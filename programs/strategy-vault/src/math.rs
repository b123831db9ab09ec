use anchor_lang::prelude::*;

use crate::{constants::MAX_BPS, errors::VaultError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Floor,
    Ceiling,
}

/// Safe multiplication then division with configurable rounding.
///
/// Computes: (value × numerator) / denominator
/// Uses u128 intermediate to prevent overflow.
pub fn mul_div(value: u64, numerator: u64, denominator: u64, rounding: Rounding) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?;

    let denom = denominator as u128;
    let result = match rounding {
        Rounding::Floor => product / denom,
        Rounding::Ceiling => product
            .checked_add(denom - 1)
            .ok_or(VaultError::MathOverflow)?
            / denom,
    };

    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// `value × bps / 10_000`, rounded down.
pub fn bps_of(value: u64, bps: u64) -> Result<u64> {
    mul_div(value, bps, MAX_BPS, Rounding::Floor)
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(error!(VaultError::MathOverflow))
}

/// Subtraction on ledger quantities. Underflow means the books are
/// inconsistent, never a user error.
pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(error!(VaultError::InvariantViolation))
}
