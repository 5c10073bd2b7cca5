use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use anyhow::Result;

use crate::errors::DrainError;
use crate::retry::RetryPolicy;

/// Largest transfer batch whose worst case (a destination account creation
/// per holding) still fits in one packet.
pub const MAX_TRANSFER_BATCH_SIZE: usize = 8;
pub const MAX_CLOSE_BATCH_SIZE: usize = 27;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub solana: SolanaConfig,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub keypair_path: String,
    pub destination_address: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub transfer_batch_size: usize,
    pub close_batch_size: usize,
    pub iteration_delay_ms: u64,
    pub fee_reserve_lamports: u64,
    pub dust_threshold_lamports: u64,
    pub query_attempts: u32,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transfer_batch_size: 5,
            close_batch_size: 27,
            iteration_delay_ms: 10_000,
            fee_reserve_lamports: 10_000_000,
            dust_threshold_lamports: 100_000,
            query_attempts: 4,
            dry_run: false,
        }
    }
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone)]
pub struct DrainConfig {
    pub destination: Pubkey,
    pub transfer_batch_size: usize,
    pub close_batch_size: usize,
    pub iteration_delay: Duration,
    pub fee_reserve_lamports: u64,
    pub dust_threshold_lamports: u64,
    pub retry: RetryPolicy,
    pub dry_run: bool,
}

impl DrainConfig {
    pub fn new(destination: Pubkey) -> Self {
        let settings = Settings::default();
        Self {
            destination,
            transfer_batch_size: settings.transfer_batch_size,
            close_batch_size: settings.close_batch_size,
            iteration_delay: Duration::from_millis(settings.iteration_delay_ms),
            fee_reserve_lamports: settings.fee_reserve_lamports,
            dust_threshold_lamports: settings.dust_threshold_lamports,
            retry: RetryPolicy::default(),
            dry_run: settings.dry_run,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), DrainError> {
        let s = &self.settings;
        if s.transfer_batch_size == 0 || s.transfer_batch_size > MAX_TRANSFER_BATCH_SIZE {
            return Err(DrainError::Configuration(format!(
                "transfer_batch_size must be between 1 and {}, got {}",
                MAX_TRANSFER_BATCH_SIZE, s.transfer_batch_size
            )));
        }
        if s.close_batch_size == 0 || s.close_batch_size > MAX_CLOSE_BATCH_SIZE {
            return Err(DrainError::Configuration(format!(
                "close_batch_size must be between 1 and {}, got {}",
                MAX_CLOSE_BATCH_SIZE, s.close_batch_size
            )));
        }
        if s.query_attempts == 0 {
            return Err(DrainError::Configuration(
                "query_attempts must be at least 1".to_string(),
            ));
        }
        self.destination()?;
        self.commitment()?;
        Ok(())
    }

    pub fn destination(&self) -> std::result::Result<Pubkey, DrainError> {
        Pubkey::from_str(&self.solana.destination_address).map_err(|e| {
            DrainError::Configuration(format!(
                "invalid destination_address {:?}: {}",
                self.solana.destination_address, e
            ))
        })
    }

    pub fn commitment(&self) -> std::result::Result<CommitmentConfig, DrainError> {
        match self.solana.commitment.to_lowercase().as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(DrainError::Configuration(format!(
                "unknown commitment level {:?}",
                other
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.solana.timeout_secs)
    }

    pub fn drain_config(&self) -> std::result::Result<DrainConfig, DrainError> {
        let s = &self.settings;
        Ok(DrainConfig {
            destination: self.destination()?,
            transfer_batch_size: s.transfer_batch_size,
            close_batch_size: s.close_batch_size,
            iteration_delay: Duration::from_millis(s.iteration_delay_ms),
            fee_reserve_lamports: s.fee_reserve_lamports,
            dust_threshold_lamports: s.dust_threshold_lamports,
            retry: RetryPolicy::new(s.query_attempts, Duration::ZERO),
            dry_run: s.dry_run,
        })
    }
}
