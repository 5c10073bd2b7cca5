use log::{error, info};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token::instruction::{close_account, transfer};

use crate::core::batcher::{destination_token_account, Batch, DrainOperation};
use crate::errors::{DrainError, Result};
use crate::rpc::LedgerRpc;

/// Result of submitting one batch. Failures are values, not errors: the drain
/// loop keeps going and the next scan picks the affected accounts up again.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Submitted(Signature),
    Failed(DrainError),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Submitted(_))
    }
}

/// Encodes `batch` in order. The signer is the token account authority, the
/// fee payer and the funder of any destination accounts. Close rent goes back
/// to the signer so the final sweep collects it.
pub fn encode_batch(
    batch: &Batch,
    destination: &Pubkey,
    authority: &Pubkey,
) -> Result<Vec<Instruction>> {
    let token_program = spl_token::id();
    let mut instructions = Vec::with_capacity(batch.operations.len());

    for operation in &batch.operations {
        let ix = match operation {
            // Idempotent so a creation from an earlier, still unconfirmed pass
            // does not fail this transaction.
            DrainOperation::EnsureDestinationAccount { mint } => {
                create_associated_token_account_idempotent(
                    authority,
                    destination,
                    mint,
                    &token_program,
                )
            }
            DrainOperation::Transfer {
                mint,
                amount,
                source,
            } => transfer(
                &token_program,
                source,
                &destination_token_account(destination, mint),
                authority,
                &[],
                *amount,
            )?,
            DrainOperation::CloseAccount { source } => {
                close_account(&token_program, source, authority, authority, &[])?
            }
        };
        instructions.push(ix);
    }

    Ok(instructions)
}

pub struct Submitter<'a, R: LedgerRpc> {
    rpc: &'a R,
    destination: Pubkey,
}

impl<'a, R: LedgerRpc> Submitter<'a, R> {
    pub fn new(rpc: &'a R, destination: Pubkey) -> Self {
        Self { rpc, destination }
    }

    pub fn instructions(&self, batch: &Batch, authority: &Pubkey) -> Result<Vec<Instruction>> {
        encode_batch(batch, &self.destination, authority)
    }

    pub async fn submit(&self, batch: &Batch, signer: &Keypair) -> SubmissionOutcome {
        let instructions = match self.instructions(batch, &signer.pubkey()) {
            Ok(instructions) => instructions,
            Err(e) => {
                error!("Error building transaction: {}", e);
                return SubmissionOutcome::Failed(e);
            }
        };

        match self.rpc.send_transaction(&instructions, signer).await {
            Ok(signature) => {
                info!("Transaction sent: {}", signature);
                SubmissionOutcome::Submitted(signature)
            }
            Err(e) => {
                error!("Error sending transaction: {}", e);
                SubmissionOutcome::Failed(e.into())
            }
        }
    }
}
