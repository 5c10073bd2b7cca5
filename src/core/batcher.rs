use std::collections::HashSet;

use log::debug;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

use crate::core::scanner::TokenHolding;
use crate::errors::Result;
use crate::retry::{retry, RetryPolicy};
use crate::rpc::LedgerRpc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Transfer,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOperation {
    /// Create the destination's associated account for `mint`. Always precedes
    /// the transfer of that mint within the same batch.
    EnsureDestinationAccount { mint: Pubkey },
    Transfer {
        mint: Pubkey,
        amount: u64,
        source: Pubkey,
    },
    CloseAccount { source: Pubkey },
}

impl DrainOperation {
    pub fn phase(&self) -> Phase {
        match self {
            DrainOperation::EnsureDestinationAccount { .. } | DrainOperation::Transfer { .. } => {
                Phase::Transfer
            }
            DrainOperation::CloseAccount { .. } => Phase::Close,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub phase: Phase,
    pub holdings: Vec<TokenHolding>,
    pub operations: Vec<DrainOperation>,
}

pub fn batch_count(holdings: usize, bound: usize) -> usize {
    holdings.div_ceil(bound.max(1))
}

pub fn destination_token_account(destination: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(destination, mint)
}

pub fn close_batches(holdings: &[TokenHolding], bound: usize) -> Vec<Batch> {
    holdings
        .chunks(bound.max(1))
        .map(|chunk| Batch {
            phase: Phase::Close,
            holdings: chunk.to_vec(),
            operations: chunk
                .iter()
                .map(|holding| DrainOperation::CloseAccount {
                    source: holding.address,
                })
                .collect(),
        })
        .collect()
}

pub struct InstructionBatcher<'a, R: LedgerRpc> {
    rpc: &'a R,
    destination: Pubkey,
    retry: RetryPolicy,
}

impl<'a, R: LedgerRpc> InstructionBatcher<'a, R> {
    pub fn new(rpc: &'a R, destination: Pubkey, retry: RetryPolicy) -> Self {
        Self {
            rpc,
            destination,
            retry,
        }
    }

    /// Each mint is checked against the ledger once per call and gets at most
    /// one creation operation across all returned batches.
    pub async fn transfer_batches(
        &self,
        holdings: &[TokenHolding],
        bound: usize,
    ) -> Result<Vec<Batch>> {
        let mut checked_mints = HashSet::new();
        let mut batches = Vec::with_capacity(batch_count(holdings.len(), bound));

        for chunk in holdings.chunks(bound.max(1)) {
            let mut operations = Vec::with_capacity(chunk.len() * 2);
            for holding in chunk {
                if self
                    .needs_destination_account(&holding.mint, &mut checked_mints)
                    .await?
                {
                    operations.push(DrainOperation::EnsureDestinationAccount {
                        mint: holding.mint,
                    });
                }
                operations.push(DrainOperation::Transfer {
                    mint: holding.mint,
                    amount: holding.amount,
                    source: holding.address,
                });
            }
            batches.push(Batch {
                phase: Phase::Transfer,
                holdings: chunk.to_vec(),
                operations,
            });
        }

        Ok(batches)
    }

    async fn needs_destination_account(
        &self,
        mint: &Pubkey,
        checked_mints: &mut HashSet<Pubkey>,
    ) -> Result<bool> {
        if !checked_mints.insert(*mint) {
            return Ok(false);
        }

        let account = destination_token_account(&self.destination, mint);
        let exists = retry(self.retry, "Destination account lookup", || {
            self.rpc.account_exists(&account)
        })
        .await?;
        if !exists {
            debug!("Destination account {} for mint {} will be created", account, mint);
        }
        Ok(!exists)
    }
}
