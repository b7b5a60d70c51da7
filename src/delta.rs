//! Consecutive packet delay deltas.

use crate::flow::FlowRecord;

/// One interchange row: a sequence number and the arrival-time difference
/// (ms) to the next lower sequence number of the same flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaRow {
    pub seq: i64,
    pub delta_ms: f64,
}

/// Delta rows of one flow, ordered by ascending sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaSeries {
    label: String,
    rows: Vec<DeltaRow>,
}

impl DeltaSeries {
    pub fn new(label: impl Into<String>, rows: Vec<DeltaRow>) -> Self {
        DeltaSeries {
            label: label.into(),
            rows,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rows(&self) -> &[DeltaRow] {
        &self.rows
    }

    pub fn deltas(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.delta_ms).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the delta series of a flow.
///
/// Returns `None` for flows with fewer than two sequence numbers. Negative
/// deltas (reordering, retransmission) are kept as they are.
pub fn build(label: impl Into<String>, record: &FlowRecord) -> Option<DeltaSeries> {
    if record.len() < 2 {
        return None;
    }

    let arrivals = record.sorted_arrivals();
    let rows = arrivals
        .windows(2)
        .map(|pair| DeltaRow {
            seq: pair[1].0,
            delta_ms: pair[1].1 - pair[0].1,
        })
        .collect();

    Some(DeltaSeries::new(label, rows))
}
