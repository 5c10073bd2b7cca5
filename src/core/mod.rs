pub mod batcher;
pub mod orchestrator;
pub mod safety;
pub mod scanner;
pub mod submitter;
pub mod sweeper;
