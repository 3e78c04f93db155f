//! Cost accumulator - token counts and price across one execution
//!
//! Tools may spawn concurrent sub-calls to the model, so accumulation takes a
//! lock. Totals are monotonically non-decreasing within a run.

use std::sync::Mutex;

use crate::core::CostRecord;
use crate::llm::CompletionSummary;

/// Sums token counts and price across every model call in one execution
#[derive(Debug, Default)]
pub struct CostAccumulator {
    inner: Mutex<CostRecord>,
}

impl CostAccumulator {
    /// Create a zeroed accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one call's usage
    pub fn add(&self, input_tokens: u64, output_tokens: u64, price: f64) {
        let mut record = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        record.input_tokens += input_tokens;
        record.output_tokens += output_tokens;
        record.price += price;
    }

    /// Add the usage reported by a completion summary
    pub fn add_summary(&self, summary: &CompletionSummary) {
        self.add(summary.input_tokens, summary.output_tokens, summary.price);
    }

    /// Snapshot of the totals so far
    pub fn total(&self) -> CostRecord {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
