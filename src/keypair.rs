use std::path::Path;

use serde::Deserialize;
use solana_sdk::signature::Keypair;
use zeroize::Zeroize;

use crate::errors::{DrainError, Result};

/// The two serialized forms accepted for the wallet key file.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredKey {
    Base58(String),
    Bytes(Vec<u8>),
}

/// Loads the signing wallet from a JSON file holding either a base58 secret key
/// string or a raw array of 64 bytes.
pub fn load_keypair<P: AsRef<Path>>(path: P) -> Result<Keypair> {
    let path = path.as_ref();
    let mut content = std::fs::read_to_string(path).map_err(|e| {
        DrainError::Keypair(format!("failed to read {}: {}", path.display(), e))
    })?;
    let keypair = parse_keypair(&content);
    content.zeroize();
    keypair
}

pub fn parse_keypair(content: &str) -> Result<Keypair> {
    let stored: StoredKey = serde_json::from_str(content)
        .map_err(|e| DrainError::Keypair(format!("unrecognized key file format: {}", e)))?;

    let mut bytes = match stored {
        StoredKey::Base58(mut encoded) => {
            let decoded = bs58::decode(encoded.trim())
                .into_vec()
                .map_err(|e| DrainError::Keypair(format!("invalid base58 secret key: {}", e)));
            encoded.zeroize();
            decoded?
        }
        StoredKey::Bytes(bytes) => bytes,
    };

    let keypair = if bytes.len() == 64 {
        Keypair::from_bytes(&bytes).map_err(|e| DrainError::Keypair(e.to_string()))
    } else {
        Err(DrainError::Keypair(format!(
            "expected 64 secret key bytes, got {}",
            bytes.len()
        )))
    };
    bytes.zeroize();
    keypair
}
