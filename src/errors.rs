use solana_client::client_error::ClientError;
use solana_sdk::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("ClientError: {0}")]
    ClientError(#[from] Box<ClientError>),

    #[error("Unexpected account data for {address}: {reason}")]
    ParseError { address: String, reason: String },

    #[error("Error: `{0}`")]
    CustomError(String),
}

impl From<ClientError> for RpcError {
    fn from(err: ClientError) -> Self {
        RpcError::ClientError(Box::new(err))
    }
}

#[derive(Error, Debug)]
pub enum DrainError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    #[error("Invalid keypair: {0}")]
    Keypair(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, DrainError>;
