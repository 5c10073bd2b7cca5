use crate::core::scanner::TokenHolding;
use crate::core::submitter::SubmissionOutcome;
use crate::core::sweeper::SweepOutcome;
use crate::core::batcher::Phase;

/// Drain state machine. Each submit state carries the holdings found by the
/// scan that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub enum DrainState {
    ScanTransfers,
    SubmitTransfers(Vec<TokenHolding>),
    ScanEmpties,
    SubmitCloses(Vec<TokenHolding>),
    SweepBalance,
    Done,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStats {
    /// Scans that found work.
    pub iterations: u64,
    pub transactions_sent: u64,
    pub transactions_failed: u64,
    pub holdings_submitted: u64,
}

/// Totals for one run, logged as the final summary.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub transfers: PhaseStats,
    pub closes: PhaseStats,
    pub sweep: Option<SweepOutcome>,
}

impl DrainReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase_mut(&mut self, phase: Phase) -> &mut PhaseStats {
        match phase {
            Phase::Transfer => &mut self.transfers,
            Phase::Close => &mut self.closes,
        }
    }

    pub fn record(&mut self, phase: Phase, holdings: usize, outcome: &SubmissionOutcome) {
        let stats = self.phase_mut(phase);
        if outcome.is_success() {
            stats.transactions_sent += 1;
            stats.holdings_submitted += holdings as u64;
        } else {
            stats.transactions_failed += 1;
        }
    }
}
