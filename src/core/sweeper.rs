use log::{error, info};
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;

use crate::errors::DrainError;
use crate::retry::{retry, RetryPolicy};
use crate::rpc::LedgerRpc;

#[derive(Debug)]
pub enum SweepOutcome {
    /// Balance minus reserve was at or below the dust threshold.
    NothingToSend { balance: u64 },
    /// Dry run: the amount that would have been sent.
    Planned { lamports: u64 },
    Sent { signature: Signature, lamports: u64 },
    Failed(DrainError),
}

/// Lamports to send for `balance`, or `None` when what remains after the
/// reserve is dust.
pub fn sweep_amount(balance: u64, reserve: u64, dust_threshold: u64) -> Option<u64> {
    let to_send = balance.saturating_sub(reserve);
    if to_send <= dust_threshold {
        None
    } else {
        Some(to_send)
    }
}

pub struct BalanceSweeper<'a, R: LedgerRpc> {
    rpc: &'a R,
    reserve_lamports: u64,
    dust_threshold_lamports: u64,
    retry: RetryPolicy,
}

impl<'a, R: LedgerRpc> BalanceSweeper<'a, R> {
    pub fn new(
        rpc: &'a R,
        reserve_lamports: u64,
        dust_threshold_lamports: u64,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            rpc,
            reserve_lamports,
            dust_threshold_lamports,
            retry,
        }
    }

    /// Sends the owner's native balance, minus the fee reserve, to `destination`.
    /// Never fails: problems are reported in the outcome.
    pub async fn sweep(
        &self,
        owner: &Pubkey,
        destination: &Pubkey,
        signer: &Keypair,
        dry_run: bool,
    ) -> SweepOutcome {
        info!("Sending SOL to destination...");

        let balance = match retry(self.retry, "Balance query", || self.rpc.balance(owner)).await {
            Ok(balance) => balance,
            Err(e) => {
                error!("Error sending SOL: {}", e);
                return SweepOutcome::Failed(e.into());
            }
        };

        let lamports = match sweep_amount(
            balance,
            self.reserve_lamports,
            self.dust_threshold_lamports,
        ) {
            Some(lamports) => lamports,
            None => {
                info!(
                    "No funds to send (balance {:.4} SOL).",
                    lamports_to_sol(balance)
                );
                return SweepOutcome::NothingToSend { balance };
            }
        };

        info!(
            "Sending {:.4} SOL to {}",
            lamports_to_sol(lamports),
            destination
        );
        if dry_run {
            return SweepOutcome::Planned { lamports };
        }

        let ix = system_instruction::transfer(&signer.pubkey(), destination, lamports);
        match self.rpc.send_transaction(&[ix], signer).await {
            Ok(signature) => {
                info!("Complete. Signature: {}", signature);
                SweepOutcome::Sent {
                    signature,
                    lamports,
                }
            }
            Err(e) => {
                error!("Error sending SOL: {}", e);
                SweepOutcome::Failed(e.into())
            }
        }
    }
}
