use anchor_lang::prelude::*;

use crate::{errors::VaultError, state::VaultState};

/// Operation a caller asks to perform, as seen by the authorization predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Fees, deposit limit, roles, health-check limits
    ConfigureVault,
    /// Register or migrate strategies
    ManageStrategies,
    /// Debt ratios, harvest bounds, queue order, health-check override
    TuneStrategy,
    Revoke { strategy: Pubkey },
    ActivateShutdown,
    DeactivateShutdown,
    Report { strategy: Pubkey },
}

/// Predicate deciding whether `caller` may perform `action`.
///
/// The ledger consults it before every privileged mutation and holds no role
/// logic of its own.
pub trait Authorize {
    fn is_authorized(&self, caller: &Pubkey, action: &Action) -> bool;
}

pub fn require_authorized(auth: &dyn Authorize, caller: &Pubkey, action: Action) -> Result<()> {
    require!(
        auth.is_authorized(caller, &action),
        VaultError::Unauthorized
    );
    Ok(())
}

/// Role wiring used by the on-chain instructions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaultRoles {
    pub governance: Pubkey,
    pub management: Pubkey,
    pub guardian: Pubkey,
}

impl VaultRoles {
    pub fn from_vault(vault: &VaultState) -> Self {
        Self {
            governance: vault.governance,
            management: vault.management,
            guardian: vault.guardian,
        }
    }
}

impl Authorize for VaultRoles {
    fn is_authorized(&self, caller: &Pubkey, action: &Action) -> bool {
        let governance = *caller == self.governance;
        let management = *caller == self.management;
        let guardian = *caller == self.guardian;

        match action {
            Action::ConfigureVault | Action::ManageStrategies | Action::DeactivateShutdown => {
                governance
            }
            Action::TuneStrategy => governance || management,
            Action::ActivateShutdown => governance || guardian,
            Action::Revoke { strategy } => {
                governance || management || guardian || caller == strategy
            }
            Action::Report { strategy } => caller == strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> VaultRoles {
        VaultRoles {
            governance: Pubkey::new_unique(),
            management: Pubkey::new_unique(),
            guardian: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_governance_only_actions() {
        let roles = roles();
        assert!(roles.is_authorized(&roles.governance, &Action::ManageStrategies));
        assert!(!roles.is_authorized(&roles.management, &Action::ManageStrategies));
        assert!(!roles.is_authorized(&roles.guardian, &Action::DeactivateShutdown));
    }

    #[test]
    fn test_guardian_can_only_activate_shutdown() {
        let roles = roles();
        assert!(roles.is_authorized(&roles.guardian, &Action::ActivateShutdown));
        assert!(!roles.is_authorized(&roles.guardian, &Action::DeactivateShutdown));
        assert!(!roles.is_authorized(&roles.management, &Action::ActivateShutdown));
    }

    #[test]
    fn test_strategy_reports_and_revokes_itself() {
        let roles = roles();
        let strategy = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        assert!(roles.is_authorized(&strategy, &Action::Report { strategy }));
        assert!(!roles.is_authorized(&other, &Action::Report { strategy }));
        assert!(!roles.is_authorized(&roles.governance, &Action::Report { strategy }));
        assert!(roles.is_authorized(&strategy, &Action::Revoke { strategy }));
        assert!(!roles.is_authorized(&other, &Action::Revoke { strategy }));
    }

    #[test]
    fn test_require_authorized_maps_to_error() {
        let roles = roles();
        let stranger = Pubkey::new_unique();
        let err = require_authorized(&roles, &stranger, Action::TuneStrategy).unwrap_err();
        assert_eq!(
            err,
            anchor_lang::error::Error::from(VaultError::Unauthorized)
        );
    }
}
