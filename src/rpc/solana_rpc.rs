use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use solana_account_decoder::parse_token::UiTokenAmount;
use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;

use super::LedgerRpc;
use crate::core::scanner::TokenHolding;
use crate::errors::RpcError;

#[derive(Deserialize)]
struct ParsedTokenAccount {
    info: ParsedTokenAccountInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedTokenAccountInfo {
    mint: String,
    token_amount: UiTokenAmount,
}

pub struct SolanaRpc {
    client: RpcClient,
}

impl Debug for SolanaRpc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolanaRpc {{ client: {:?} }}", self.client.url())
    }
}

impl SolanaRpc {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig, timeout: Duration) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(
                rpc_url.to_string(),
                timeout,
                commitment,
            ),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

fn parse_error(address: &str, reason: impl ToString) -> RpcError {
    RpcError::ParseError {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_holding(address: &str, data: &UiAccountData) -> Result<TokenHolding, RpcError> {
    let parsed = match data {
        UiAccountData::Json(parsed) => parsed,
        _ => return Err(parse_error(address, "expected jsonParsed token account")),
    };
    let account: ParsedTokenAccount =
        serde_json::from_value(parsed.parsed.clone()).map_err(|e| parse_error(address, e))?;
    let token_amount = &account.info.token_amount;

    let amount = token_amount
        .amount
        .parse::<u64>()
        .map_err(|e| parse_error(address, e))?;
    let ui_amount = match token_amount.ui_amount {
        Some(ui_amount) => ui_amount,
        None => token_amount
            .ui_amount_string
            .parse::<f64>()
            .map_err(|e| parse_error(address, e))?,
    };

    Ok(TokenHolding {
        mint: Pubkey::from_str(&account.info.mint).map_err(|e| parse_error(address, e))?,
        address: Pubkey::from_str(address).map_err(|e| parse_error(address, e))?,
        amount,
        ui_amount,
        decimals: token_amount.decimals,
    })
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, RpcError> {
        let accounts = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(spl_token::id()))
            .await?;
        debug!("RPC returned {} token accounts for {}", accounts.len(), owner);

        accounts
            .iter()
            .map(|keyed| parse_holding(&keyed.pubkey, &keyed.account.data))
            .collect()
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await?;
        Ok(response.value.is_some())
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.client.get_balance(address).await?)
    }

    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        signer: &Keypair,
    ) -> Result<Signature, RpcError> {
        let recent_blockhash = self.client.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&signer.pubkey()),
            &[signer],
            recent_blockhash,
        );
        Ok(self.client.send_transaction(&tx).await?)
    }
}
