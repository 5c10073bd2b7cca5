mod solana_rpc;

pub use solana_rpc::SolanaRpc;

use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

use crate::core::scanner::TokenHolding;
use crate::errors::RpcError;

/// The ledger operations the drain pipeline consumes. Every call may fail;
/// callers decide whether to retry.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// All SPL token accounts owned by `owner`, unfiltered.
    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, RpcError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError>;

    /// Native balance in lamports.
    async fn balance(&self, address: &Pubkey) -> Result<u64, RpcError>;

    /// Signs `instructions` into one transaction paid by `signer` and submits it
    /// without waiting for confirmation.
    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        signer: &Keypair,
    ) -> Result<Signature, RpcError>;
}
