#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_program;
use spl_associated_token_account::get_associated_token_address;
use spl_token::instruction::TokenInstruction;
use token_drain::config::DrainConfig;
use token_drain::core::scanner::TokenHolding;
use token_drain::errors::RpcError;
use token_drain::rpc::LedgerRpc;

pub const RENT_LAMPORTS: u64 = 2_039_280;
pub const FEE_LAMPORTS: u64 = 5_000;
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Clone, Debug)]
pub struct MockTokenAccount {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub decimals: u8,
}

#[derive(Clone, Default)]
struct Ledger {
    token_accounts: Vec<(Pubkey, MockTokenAccount)>,
    balances: HashMap<Pubkey, u64>,
}

impl Ledger {
    fn token_account_mut(&mut self, address: &Pubkey) -> Result<&mut MockTokenAccount, RpcError> {
        self.token_accounts
            .iter_mut()
            .find(|(a, _)| a == address)
            .map(|(_, account)| account)
            .ok_or_else(|| fail(format!("token account {} not found", address)))
    }

    fn exists(&self, address: &Pubkey) -> bool {
        self.token_accounts.iter().any(|(a, _)| a == address) || self.balances.contains_key(address)
    }

    fn debit(&mut self, address: &Pubkey, lamports: u64) -> Result<(), RpcError> {
        let balance = self.balances.entry(*address).or_default();
        if *balance < lamports {
            return Err(fail(format!("insufficient lamports in {}", address)));
        }
        *balance -= lamports;
        Ok(())
    }

    fn credit(&mut self, address: &Pubkey, lamports: u64) {
        *self.balances.entry(*address).or_default() += lamports;
    }

    fn apply(&mut self, ix: &Instruction) -> Result<(), RpcError> {
        let key = |i: usize| ix.accounts[i].pubkey;

        if ix.program_id == spl_token::id() {
            match TokenInstruction::unpack(&ix.data).map_err(|e| fail(e.to_string()))? {
                TokenInstruction::Transfer { amount } => {
                    let (source, destination, authority) = (key(0), key(1), key(2));
                    let mint = {
                        let src = self.token_account_mut(&source)?;
                        if src.owner != authority {
                            return Err(fail("owner does not match".to_string()));
                        }
                        if src.amount < amount {
                            return Err(fail("insufficient funds".to_string()));
                        }
                        src.amount -= amount;
                        src.mint
                    };
                    let dst = self.token_account_mut(&destination)?;
                    if dst.mint != mint {
                        return Err(fail("mint mismatch".to_string()));
                    }
                    dst.amount += amount;
                    Ok(())
                }
                TokenInstruction::CloseAccount => {
                    let (account, destination, authority) = (key(0), key(1), key(2));
                    let closing = self.token_account_mut(&account)?;
                    if closing.owner != authority {
                        return Err(fail("owner does not match".to_string()));
                    }
                    if closing.amount != 0 {
                        return Err(fail("non-native account has balance".to_string()));
                    }
                    self.token_accounts.retain(|(a, _)| *a != account);
                    self.credit(&destination, RENT_LAMPORTS);
                    Ok(())
                }
                _ => Err(fail("unsupported token instruction".to_string())),
            }
        } else if ix.program_id == spl_associated_token_account::id() {
            let (funder, address, wallet, mint) = (key(0), key(1), key(2), key(3));
            if address != get_associated_token_address(&wallet, &mint) {
                return Err(fail("invalid associated account address".to_string()));
            }
            if self.exists(&address) {
                // CreateIdempotent leaves an existing associated account alone.
                if ix.data == [1] {
                    return Ok(());
                }
                return Err(fail(format!("account {} already in use", address)));
            }
            self.debit(&funder, RENT_LAMPORTS)?;
            let decimals = self
                .token_accounts
                .iter()
                .find(|(_, a)| a.mint == mint)
                .map(|(_, a)| a.decimals)
                .unwrap_or(0);
            self.token_accounts.push((
                address,
                MockTokenAccount {
                    owner: wallet,
                    mint,
                    amount: 0,
                    decimals,
                },
            ));
            Ok(())
        } else if ix.program_id == system_program::id() {
            // SystemInstruction::Transfer: u32 tag 2 followed by u64 lamports.
            if ix.data.len() != 12 || ix.data[0..4] != [2, 0, 0, 0] {
                return Err(fail("unsupported system instruction".to_string()));
            }
            let mut lamports = [0u8; 8];
            lamports.copy_from_slice(&ix.data[4..12]);
            let lamports = u64::from_le_bytes(lamports);
            self.debit(&key(0), lamports)?;
            self.credit(&key(1), lamports);
            Ok(())
        } else {
            Err(fail(format!("unknown program {}", ix.program_id)))
        }
    }
}

fn fail(message: String) -> RpcError {
    RpcError::CustomError(message)
}

#[derive(Default)]
struct Inner {
    ledger: Ledger,
    sent: Vec<Vec<Instruction>>,
    failing_sends: HashSet<usize>,
    scan_failures: u32,
    scan_calls: usize,
    existence_checks: usize,
}

/// In-memory ledger that applies submitted instructions atomically.
#[derive(Default)]
pub struct MockLedger {
    inner: Mutex<Inner>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token_account(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let address = Pubkey::new_unique();
        self.insert_token_account(address, owner, mint, amount);
        address
    }

    pub fn insert_token_account(&self, address: Pubkey, owner: &Pubkey, mint: &Pubkey, amount: u64) {
        self.inner.lock().unwrap().ledger.token_accounts.push((
            address,
            MockTokenAccount {
                owner: *owner,
                mint: *mint,
                amount,
                decimals: 0,
            },
        ));
    }

    pub fn set_balance(&self, address: &Pubkey, lamports: u64) {
        self.inner
            .lock()
            .unwrap()
            .ledger
            .balances
            .insert(*address, lamports);
    }

    pub fn balance_of(&self, address: &Pubkey) -> u64 {
        self.inner
            .lock()
            .unwrap()
            .ledger
            .balances
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Makes the `index`-th submission (0-based, counting every call) fail.
    pub fn fail_send(&self, index: usize) {
        self.inner.lock().unwrap().failing_sends.insert(index);
    }

    /// Makes the next `count` scans fail.
    pub fn fail_scans(&self, count: u32) {
        self.inner.lock().unwrap().scan_failures = count;
    }

    pub fn sent(&self) -> Vec<Vec<Instruction>> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn scan_calls(&self) -> usize {
        self.inner.lock().unwrap().scan_calls
    }

    pub fn existence_checks(&self) -> usize {
        self.inner.lock().unwrap().existence_checks
    }

    pub fn token_accounts_of(&self, owner: &Pubkey) -> Vec<(Pubkey, MockTokenAccount)> {
        self.inner
            .lock()
            .unwrap()
            .ledger
            .token_accounts
            .iter()
            .filter(|(_, a)| a.owner == *owner)
            .cloned()
            .collect()
    }

    pub fn token_amount(&self, address: &Pubkey) -> Option<u64> {
        self.inner
            .lock()
            .unwrap()
            .ledger
            .token_accounts
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, a)| a.amount)
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        inner.scan_calls += 1;
        if inner.scan_failures > 0 {
            inner.scan_failures -= 1;
            return Err(fail("scan unavailable".to_string()));
        }

        Ok(inner
            .ledger
            .token_accounts
            .iter()
            .filter(|(_, a)| a.owner == *owner)
            .map(|(address, a)| TokenHolding {
                mint: a.mint,
                address: *address,
                amount: a.amount,
                ui_amount: a.amount as f64 / 10f64.powi(a.decimals as i32),
                decimals: a.decimals,
            })
            .collect())
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        inner.existence_checks += 1;
        Ok(inner.ledger.exists(address))
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.balance_of(address))
    }

    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        signer: &Keypair,
    ) -> Result<Signature, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        let index = inner.sent.len();
        inner.sent.push(instructions.to_vec());
        if inner.failing_sends.contains(&index) {
            return Err(fail(format!("injected failure for transaction {}", index)));
        }

        let mut next = inner.ledger.clone();
        next.debit(&signer.pubkey(), FEE_LAMPORTS)?;
        for ix in instructions {
            next.apply(ix)?;
        }
        inner.ledger = next;
        Ok(Signature::new_unique())
    }
}

pub fn test_config(destination: Pubkey) -> DrainConfig {
    DrainConfig {
        iteration_delay: Duration::ZERO,
        ..DrainConfig::new(destination)
    }
}

pub fn funded_wallet(ledger: &MockLedger) -> Keypair {
    let wallet = Keypair::new();
    ledger.set_balance(&wallet.pubkey(), LAMPORTS_PER_SOL);
    wallet
}
