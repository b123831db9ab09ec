//! Vault accounting core
//!
//! Plain-Rust operations on [`VaultState`](crate::state::VaultState): share
//! accounting, allocation, the settlement cycle, the withdrawal waterfall and
//! strategy lifecycle. Strategies, token custody, health checks and roles are
//! reached only through the traits in [`adapter`] and [`auth`], so the same
//! code runs inside instruction handlers and in host tests.

pub mod accounting;
pub mod adapter;
pub mod auth;
pub mod lifecycle;
pub mod settlement;
pub mod waterfall;

pub use adapter::{AssetCustody, HealthCheck, StrategyAdapter};
pub use auth::{require_authorized, Action, Authorize, VaultRoles};
pub use lifecycle::{Role, StrategyConfig};
pub use settlement::{FeeShares, SettlementOutcome, StrategyReport};
pub use waterfall::WithdrawalOutcome;
