//! On-chain implementations of the ledger's external capabilities
//!
//! Strategies are separate programs that own their strategy account and
//! expose Anchor instructions `total_assets()`, `is_locked()`,
//! `withdraw(amount: u64)` and `migrate(new_strategy: Pubkey)`. Queries run
//! without privileges and answer through return data. Calls that move funds
//! are signed by the vault authority PDA, but the ledger only trusts token
//! balances for what actually moved.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::{get_return_data, invoke, invoke_signed},
};
use anchor_spl::token::{self, TokenAccount, Transfer};
use solana_sha256_hasher::hash;

use crate::{
    errors::VaultError,
    ledger::{AssetCustody, StrategyAdapter},
};

/// Anchor instruction discriminator for `name`
fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{name}");
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    discriminator
}

/// Return data of the last call, if `program` set it
fn return_data(program: &Pubkey) -> Vec<u8> {
    match get_return_data() {
        Some((from, data)) if from == *program => data,
        _ => Vec::new(),
    }
}

/// Live token balance of an SPL token account
pub fn token_amount(account: &AccountInfo) -> Result<u64> {
    let data = account.try_borrow_data()?;
    let token_account = TokenAccount::try_deserialize(&mut &data[..])?;
    Ok(token_account.amount)
}

/// Read-only strategy calls, answered through return data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyQuery {
    TotalAssets,
    IsLocked,
}

impl StrategyQuery {
    fn name(self) -> &'static str {
        match self {
            Self::TotalAssets => "total_assets",
            Self::IsLocked => "is_locked",
        }
    }
}

/// Strategy calls that move funds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyCommand {
    Withdraw(u64),
    Migrate {
        new_strategy: Pubkey,
        new_strategy_token_account: Pubkey,
    },
}

impl StrategyCommand {
    fn data(&self) -> Vec<u8> {
        match self {
            Self::Withdraw(amount) => {
                let mut data = sighash("withdraw").to_vec();
                data.extend_from_slice(&amount.to_le_bytes());
                data
            }
            Self::Migrate { new_strategy, .. } => {
                let mut data = sighash("migrate").to_vec();
                data.extend_from_slice(new_strategy.as_ref());
                data
            }
        }
    }
}

/// Vault accounts handed to a fund-moving strategy call
#[derive(Clone, Copy, Debug)]
pub struct CustodyKeys {
    pub vault_token_account: Pubkey,
    pub vault_authority: Pubkey,
    pub token_program: Pubkey,
}

/// Keys identifying one strategy
#[derive(Clone, Copy, Debug)]
pub struct StrategyKeys {
    pub strategy: Pubkey,
    pub strategy_program: Pubkey,
    pub strategy_token_account: Pubkey,
}

impl StrategyKeys {
    /// Strategy accounts passed read-only; nothing signs
    pub fn query(&self, query: StrategyQuery) -> Instruction {
        Instruction {
            program_id: self.strategy_program,
            accounts: vec![
                AccountMeta::new_readonly(self.strategy, false),
                AccountMeta::new_readonly(self.strategy_token_account, false),
            ],
            data: sighash(query.name()).to_vec(),
        }
    }

    /// Strategy and vault token accounts writable, the vault authority signs.
    /// Migration appends the replacement accounts, also writable.
    pub fn command(&self, custody: &CustodyKeys, command: &StrategyCommand) -> Instruction {
        let mut accounts = vec![
            AccountMeta::new(self.strategy, false),
            AccountMeta::new(self.strategy_token_account, false),
            AccountMeta::new(custody.vault_token_account, false),
            AccountMeta::new_readonly(custody.vault_authority, true),
            AccountMeta::new_readonly(custody.token_program, false),
        ];
        if let StrategyCommand::Migrate {
            new_strategy,
            new_strategy_token_account,
        } = command
        {
            accounts.push(AccountMeta::new(*new_strategy, false));
            accounts.push(AccountMeta::new(*new_strategy_token_account, false));
        }

        Instruction {
            program_id: self.strategy_program,
            accounts,
            data: command.data(),
        }
    }
}

/// A strategy's own accounts as passed to an instruction
#[derive(Clone)]
pub struct StrategyAccounts<'info> {
    /// Strategy state account, owned by its program; its key is the ledger id
    pub strategy: AccountInfo<'info>,
    pub strategy_program: AccountInfo<'info>,
    /// Token account holding the strategy's idle assets
    pub strategy_token_account: AccountInfo<'info>,
}

impl<'info> StrategyAccounts<'info> {
    /// The program must own the strategy account, and the token account must
    /// hold the vault asset on behalf of the strategy.
    pub fn validate(&self, asset_mint: &Pubkey) -> Result<()> {
        require!(
            self.strategy_program.executable,
            VaultError::InvalidStrategyProgram
        );
        require_keys_eq!(
            *self.strategy.owner,
            *self.strategy_program.key,
            VaultError::InvalidStrategyProgram
        );
        require_keys_eq!(
            *self.strategy_token_account.owner,
            token::ID,
            VaultError::InvalidOwner
        );

        let data = self.strategy_token_account.try_borrow_data()?;
        let token_account = TokenAccount::try_deserialize(&mut &data[..])?;
        require_keys_eq!(token_account.mint, *asset_mint, VaultError::InvalidMint);
        require_keys_eq!(
            token_account.owner,
            *self.strategy.key,
            VaultError::InvalidOwner
        );
        Ok(())
    }

    pub fn keys(&self) -> StrategyKeys {
        StrategyKeys {
            strategy: *self.strategy.key,
            strategy_program: *self.strategy_program.key,
            strategy_token_account: *self.strategy_token_account.key,
        }
    }

    fn query(&self, query: StrategyQuery) -> Result<Vec<u8>> {
        let ix = self.keys().query(query);
        invoke(
            &ix,
            &[
                self.strategy.clone(),
                self.strategy_token_account.clone(),
                self.strategy_program.clone(),
            ],
        )?;
        Ok(return_data(self.strategy_program.key))
    }

    /// Everything the strategy program accounts for, staked or idle
    pub fn total_assets(&self) -> Result<u64> {
        let data = self.query(StrategyQuery::TotalAssets)?;
        let bytes: [u8; 8] = data
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .ok_or(VaultError::InvalidStrategyResponse)?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn is_locked(&self) -> Result<bool> {
        let data = self.query(StrategyQuery::IsLocked)?;
        Ok(data.first().is_some_and(|flag| *flag != 0))
    }
}

/// Strategy program reached through CPI
pub struct CpiStrategy<'a, 'info> {
    pub accounts: StrategyAccounts<'info>,
    pub vault_token_account: AccountInfo<'info>,
    pub vault_authority: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    /// Replacement strategy and its token account, required by `migrate`
    pub migration_target: Option<(AccountInfo<'info>, AccountInfo<'info>)>,
    pub signer_seeds: &'a [&'a [&'a [u8]]],
}

impl<'a, 'info> CpiStrategy<'a, 'info> {
    pub fn custody_keys(&self) -> CustodyKeys {
        CustodyKeys {
            vault_token_account: *self.vault_token_account.key,
            vault_authority: *self.vault_authority.key,
            token_program: *self.token_program.key,
        }
    }

    fn execute(&self, command: &StrategyCommand) -> Result<()> {
        let ix = self.accounts.keys().command(&self.custody_keys(), command);

        let mut infos = vec![
            self.accounts.strategy.clone(),
            self.accounts.strategy_token_account.clone(),
            self.vault_token_account.clone(),
            self.vault_authority.clone(),
            self.token_program.clone(),
        ];
        if let Some((new_strategy, new_token_account)) = &self.migration_target {
            infos.push(new_strategy.clone());
            infos.push(new_token_account.clone());
        }
        infos.push(self.accounts.strategy_program.clone());

        invoke_signed(&ix, &infos, self.signer_seeds)?;
        Ok(())
    }
}

impl StrategyAdapter for CpiStrategy<'_, '_> {
    fn key(&self) -> Pubkey {
        *self.accounts.strategy.key
    }

    fn total_assets(&self) -> Result<u64> {
        self.accounts.total_assets()
    }

    fn withdraw(&mut self, amount: u64) -> Result<u64> {
        self.execute(&StrategyCommand::Withdraw(amount))?;
        let data = return_data(self.accounts.strategy_program.key);
        Ok(data
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
            .unwrap_or(0))
    }

    fn migrate(&mut self, new_strategy: &Pubkey) -> Result<()> {
        let (target, target_token_account) = self
            .migration_target
            .as_ref()
            .ok_or(VaultError::MissingStrategyAccounts)?;
        require_keys_eq!(
            *target.key,
            *new_strategy,
            VaultError::MissingStrategyAccounts
        );

        let command = StrategyCommand::Migrate {
            new_strategy: *new_strategy,
            new_strategy_token_account: *target_token_account.key,
        };
        self.execute(&command)
    }

    fn is_locked(&self) -> Result<bool> {
        self.accounts.is_locked()
    }
}

/// Group `remaining_accounts` into strategies, three accounts each:
/// `[strategy, strategy_program, strategy_token_account]`. Every triple is
/// validated against `asset_mint` before it can be withdrawn from.
pub fn strategies_from_remaining<'a, 'info>(
    remaining: &[AccountInfo<'info>],
    asset_mint: &Pubkey,
    vault_token_account: &AccountInfo<'info>,
    vault_authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    signer_seeds: &'a [&'a [&'a [u8]]],
) -> Result<Vec<CpiStrategy<'a, 'info>>> {
    require!(
        remaining.len() % 3 == 0,
        VaultError::MissingStrategyAccounts
    );

    remaining
        .chunks(3)
        .map(|group| {
            let accounts = StrategyAccounts {
                strategy: group[0].clone(),
                strategy_program: group[1].clone(),
                strategy_token_account: group[2].clone(),
            };
            accounts.validate(asset_mint)?;

            Ok(CpiStrategy {
                accounts,
                vault_token_account: vault_token_account.clone(),
                vault_authority: vault_authority.clone(),
                token_program: token_program.clone(),
                migration_target: None,
                signer_seeds,
            })
        })
        .collect()
}

/// The vault token account, moved by the vault authority PDA
pub struct TokenCustody<'a, 'info> {
    vault_token_account: AccountInfo<'info>,
    vault_authority: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    signer_seeds: &'a [&'a [&'a [u8]]],
    /// Ledger key -> token account receiving transfers for that key
    destinations: Vec<(Pubkey, AccountInfo<'info>)>,
}

impl<'a, 'info> TokenCustody<'a, 'info> {
    pub fn new(
        vault_token_account: AccountInfo<'info>,
        vault_authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        signer_seeds: &'a [&'a [&'a [u8]]],
    ) -> Self {
        Self {
            vault_token_account,
            vault_authority,
            token_program,
            signer_seeds,
            destinations: Vec::new(),
        }
    }

    pub fn with_destination(mut self, key: Pubkey, account: AccountInfo<'info>) -> Self {
        self.destinations.push((key, account));
        self
    }
}

impl AssetCustody for TokenCustody<'_, '_> {
    fn balance(&self) -> Result<u64> {
        token_amount(&self.vault_token_account)
    }

    fn transfer_out(&mut self, destination: &Pubkey, amount: u64) -> Result<()> {
        let to = self
            .destinations
            .iter()
            .find(|(key, _)| key == destination)
            .map(|(_, account)| account.clone())
            .ok_or(VaultError::InvalidOwner)?;

        let transfer_ctx = CpiContext::new_with_signer(
            self.token_program.clone(),
            Transfer {
                from: self.vault_token_account.clone(),
                to,
                authority: self.vault_authority.clone(),
            },
            self.signer_seeds,
        );
        token::transfer(transfer_ctx, amount)
    }
}
