pub mod config;
pub mod core;
pub mod errors;
pub mod keypair;
pub mod retry;
pub mod rpc;
pub mod state;
