use solana_sdk::pubkey::Pubkey;
use log::{debug, info};

use crate::core::safety::is_drain_candidate;
use crate::errors::Result;
use crate::retry::{retry, RetryPolicy};
use crate::rpc::LedgerRpc;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenHolding {
    pub mint: Pubkey,
    pub address: Pubkey,
    /// Balance in the mint's smallest unit.
    pub amount: u64,
    pub ui_amount: f64,
    pub decimals: u8,
}

pub struct Scanner<'a, R: LedgerRpc> {
    rpc: &'a R,
    retry: RetryPolicy,
}

impl<'a, R: LedgerRpc> Scanner<'a, R> {
    pub fn new(rpc: &'a R, retry: RetryPolicy) -> Self {
        Self { rpc, retry }
    }

    pub async fn scan(&self, owner: &Pubkey, empty_only: bool) -> Result<Vec<TokenHolding>> {
        let holdings = retry(self.retry, "Token account scan", || {
            self.rpc.token_holdings(owner)
        })
        .await?;
        let total = holdings.len();

        let candidates: Vec<TokenHolding> = holdings
            .into_iter()
            .filter(|holding| is_drain_candidate(holding, empty_only))
            .collect();

        debug!(
            "Scan of {} kept {} of {} token accounts (empty_only: {})",
            owner,
            candidates.len(),
            total,
            empty_only
        );
        if !candidates.is_empty() {
            let kind = if empty_only { "empty" } else { "funded" };
            info!("Found {} {} accounts...", candidates.len(), kind);
        }

        Ok(candidates)
    }
}
