use log::{info, warn};
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tokio::time::sleep;

use crate::config::DrainConfig;
use crate::core::batcher::{close_batches, Batch, InstructionBatcher, Phase};
use crate::core::safety::phase_complete;
use crate::core::scanner::{Scanner, TokenHolding};
use crate::core::submitter::Submitter;
use crate::core::sweeper::{BalanceSweeper, SweepOutcome};
use crate::errors::Result;
use crate::rpc::LedgerRpc;
use crate::state::{DrainReport, DrainState};

/// Drives the drain: transfer every funded token account to the destination,
/// close every emptied account, then sweep the native balance.
///
/// Each phase loops on a fresh scan and ends only when the scan comes back
/// empty, so batches that fail are picked up again on the next pass. Scan
/// failures that survive retry abort the run.
pub struct DrainOrchestrator<R: LedgerRpc> {
    rpc: R,
    signer: Keypair,
    config: DrainConfig,
}

impl<R: LedgerRpc> DrainOrchestrator<R> {
    pub fn new(rpc: R, signer: Keypair, config: DrainConfig) -> Self {
        Self {
            rpc,
            signer,
            config,
        }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn owner(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub async fn run(&self) -> Result<DrainReport> {
        let mut report = DrainReport::new();
        let mut state = DrainState::ScanTransfers;

        info!("Transferring tokens to {}...", self.config.destination);
        while state != DrainState::Done {
            state = self.step(state, &mut report).await?;
        }

        log_summary(&report);
        Ok(report)
    }

    pub async fn step(&self, state: DrainState, report: &mut DrainReport) -> Result<DrainState> {
        let owner = self.owner();
        let scanner = Scanner::new(&self.rpc, self.config.retry);

        let next = match state {
            DrainState::ScanTransfers => {
                let holdings = scanner.scan(&owner, false).await?;
                if phase_complete(&holdings) {
                    info!("Finished transferring tokens.");
                    info!("Closing emptied accounts to reclaim SOL...");
                    DrainState::ScanEmpties
                } else {
                    report.transfers.iterations += 1;
                    DrainState::SubmitTransfers(holdings)
                }
            }
            DrainState::SubmitTransfers(holdings) => {
                let batcher =
                    InstructionBatcher::new(&self.rpc, self.config.destination, self.config.retry);
                let batches = batcher
                    .transfer_batches(&holdings, self.config.transfer_batch_size)
                    .await?;
                if self.submit_all(&batches, report).await {
                    DrainState::ScanTransfers
                } else {
                    DrainState::ScanEmpties
                }
            }
            DrainState::ScanEmpties => {
                let holdings = scanner.scan(&owner, true).await?;
                if phase_complete(&holdings) {
                    info!("Finished closing empty accounts.");
                    DrainState::SweepBalance
                } else {
                    report.closes.iterations += 1;
                    DrainState::SubmitCloses(holdings)
                }
            }
            DrainState::SubmitCloses(holdings) => {
                let batches = close_batches(&holdings, self.config.close_batch_size);
                if self.submit_all(&batches, report).await {
                    DrainState::ScanEmpties
                } else {
                    DrainState::SweepBalance
                }
            }
            DrainState::SweepBalance => {
                let sweeper = BalanceSweeper::new(
                    &self.rpc,
                    self.config.fee_reserve_lamports,
                    self.config.dust_threshold_lamports,
                    self.config.retry,
                );
                let outcome = sweeper
                    .sweep(
                        &owner,
                        &self.config.destination,
                        &self.signer,
                        self.config.dry_run,
                    )
                    .await;
                report.sweep = Some(outcome);
                DrainState::Done
            }
            DrainState::Done => DrainState::Done,
        };

        Ok(next)
    }

    // Returns false in dry-run mode: nothing was sent, so the phase must not re-scan.
    async fn submit_all(&self, batches: &[Batch], report: &mut DrainReport) -> bool {
        let total = batches.len();

        if self.config.dry_run {
            for (i, batch) in batches.iter().enumerate() {
                log_planned(i + 1, total, batch);
            }
            warn!("Dry run: {} transaction(s) not sent.", total);
            return false;
        }

        let submitter = Submitter::new(&self.rpc, self.config.destination);
        for (i, batch) in batches.iter().enumerate() {
            info!("Sending transaction {} / {}...", i + 1, total);
            let outcome = submitter.submit(batch, &self.signer).await;
            report.record(batch.phase, batch.holdings.len(), &outcome);
        }

        if !self.config.iteration_delay.is_zero() {
            sleep(self.config.iteration_delay).await;
        }
        true
    }
}

fn log_planned(index: usize, total: usize, batch: &Batch) {
    let action = match batch.phase {
        Phase::Transfer => "transfer",
        Phase::Close => "close",
    };
    info!(
        "Would send transaction {} / {}: {} {} account(s) in {} instruction(s)",
        index,
        total,
        action,
        batch.holdings.len(),
        batch.operations.len()
    );
    for holding in &batch.holdings {
        log_holding(holding);
    }
}

fn log_holding(holding: &TokenHolding) {
    info!(
        "  {} mint {} amount {}",
        holding.address, holding.mint, holding.ui_amount
    );
}

fn log_summary(report: &DrainReport) {
    for (name, stats) in [("Transfer", &report.transfers), ("Close", &report.closes)] {
        info!(
            "{} phase: {} pass(es), {} transaction(s) sent, {} failed, {} account(s) submitted",
            name,
            stats.iterations,
            stats.transactions_sent,
            stats.transactions_failed,
            stats.holdings_submitted
        );
    }
    match &report.sweep {
        Some(SweepOutcome::Sent { lamports, .. }) => {
            info!("Swept {:.4} SOL.", lamports_to_sol(*lamports))
        }
        Some(SweepOutcome::Planned { lamports }) => {
            info!("Would sweep {:.4} SOL.", lamports_to_sol(*lamports))
        }
        Some(SweepOutcome::NothingToSend { .. }) => info!("No SOL swept."),
        Some(SweepOutcome::Failed(e)) => warn!("SOL sweep failed: {}", e),
        None => {}
    }
}

