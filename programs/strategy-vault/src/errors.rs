use anchor_lang::prelude::*;

/// Custom error codes for the Strategy Vault program
///
/// Accounting errors (`InvariantViolation`, `MathOverflow`) are fatal and
/// abort the whole instruction. Strategy under-delivery is never an error:
/// it is booked as realized loss.
#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero - vault has no shares")]
    DivisionByZero,

    #[msg("Ledger invariant violated")]
    InvariantViolation,

    #[msg("Deposit would exceed the vault deposit limit")]
    DepositLimitExceeded,

    #[msg("Withdrawal loss exceeds the accepted maximum")]
    MaxLossExceeded,

    #[msg("Vault is in emergency shutdown")]
    VaultShutdown,

    #[msg("Strategy report rejected by health check")]
    HealthCheckFailed,

    #[msg("Vault balance does not cover the reported gain and debt payment")]
    SettlementUnderfunded,

    #[msg("Old strategy still holds assets after migration")]
    MigrationIncomplete,

    #[msg("Unauthorized - caller lacks the required role")]
    Unauthorized,

    #[msg("Invalid token mint - does not match vault asset")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Strategy already registered")]
    StrategyAlreadyExists,

    #[msg("Strategy not found in registry")]
    StrategyNotFound,

    #[msg("Strategy is not active")]
    StrategyNotActive,

    #[msg("Strategy registry is full")]
    RegistryFull,

    #[msg("Withdrawal queue is full")]
    QueueFull,

    #[msg("Withdrawal queue update is invalid")]
    InvalidQueue,

    #[msg("Fee exceeds the allowed maximum")]
    InvalidFee,

    #[msg("Minimum debt per harvest exceeds the maximum")]
    InvalidDebtBounds,

    #[msg("Loss tolerance exceeds 10000 basis points")]
    InvalidLossTolerance,

    #[msg("Strategy accounts missing from remaining accounts")]
    MissingStrategyAccounts,

    #[msg("Share balance too low for this withdrawal")]
    InsufficientShares,

    #[msg("Strategy account is not owned by the given strategy program")]
    InvalidStrategyProgram,

    #[msg("Strategy program returned no usable data")]
    InvalidStrategyResponse,
}
