//! Capture-to-TSV extraction driver.
//!
//! For each capture: read every frame, pick the sequence strategy, aggregate
//! flows, and write one `cpdv_flow<N>.tsv` per flow next to the capture.

use crate::capture::engine::{self, CaptureError};
use crate::delta;
use crate::flow::{self, FlowKey};
use crate::sequence::{SequenceExtractor, SequenceMode};
use crate::tsv::{self, TsvError};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ExtractError {
    Capture { path: PathBuf, source: CaptureError },
    /// Auto mode could not tell TCP from UDP by the first packet.
    Unclassifiable { path: PathBuf },
    Tsv(TsvError),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Capture { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            ExtractError::Unclassifiable { path } => write!(
                f,
                "{}: first packet is neither TCP nor UDP, cannot choose a sequence mode (use `tcp` or `udp`)",
                path.display()
            ),
            ExtractError::Tsv(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Capture { source, .. } => Some(source),
            ExtractError::Tsv(err) => Some(err),
            ExtractError::Unclassifiable { .. } => None,
        }
    }
}

impl From<TsvError> for ExtractError {
    fn from(err: TsvError) -> Self {
        ExtractError::Tsv(err)
    }
}

/// Why a flow produced no TSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Omission {
    TooFewSequenceNumbers,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    pub index: usize,
    pub key: FlowKey,
    pub packets: u64,
    pub sequence_numbers: usize,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omitted: Option<Omission>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub path: PathBuf,
    pub strategy: SequenceExtractor,
    pub frames: u64,
    pub records: usize,
    pub parse_errors: u64,
    /// Records the strategy found no sequence number in.
    pub skipped: u64,
    pub flows: Vec<FlowSummary>,
}

impl ExtractReport {
    pub fn files_written(&self) -> usize {
        self.flows.iter().filter(|f| f.output.is_some()).count()
    }
}

/// Name of the TSV file for flow `index`.
pub fn flow_file_name(index: usize) -> String {
    format!("cpdv_flow{}.tsv", index)
}

/// Directory the TSV files of `capture` are written to.
pub fn output_dir(capture: &Path) -> PathBuf {
    match capture.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Process one capture file.
pub fn extract_file(path: &Path, mode: SequenceMode) -> Result<ExtractReport, ExtractError> {
    let capture = engine::read_capture(path).map_err(|source| ExtractError::Capture {
        path: path.to_path_buf(),
        source,
    })?;

    let strategy = SequenceExtractor::select(mode, capture.first_transport).ok_or_else(|| {
        ExtractError::Unclassifiable {
            path: path.to_path_buf(),
        }
    })?;
    tracing::info!(path = %path.display(), strategy = %strategy, "sequence strategy selected");

    let mut aggregator = flow::FlowAggregator::new(strategy);
    for record in &capture.records {
        aggregator.observe(record);
    }
    let skipped = aggregator.skipped();
    let flows = aggregator.finish();

    let out_dir = output_dir(path);
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut summaries = Vec::with_capacity(flows.len());
    for flow in &flows {
        let mut summary = FlowSummary {
            index: flow.index,
            key: flow.key,
            packets: flow.record.packets(),
            sequence_numbers: flow.record.len(),
            rows: 0,
            output: None,
            omitted: None,
        };

        match delta::build(format!("{} {}", label, flow.key), &flow.record) {
            Some(series) => {
                let file = out_dir.join(flow_file_name(flow.index));
                tsv::write_series(&file, &series)?;
                tracing::debug!(flow = %flow.key, rows = series.len(), file = %file.display(), "flow written");
                summary.rows = series.len();
                summary.output = Some(file);
            }
            None => {
                tracing::debug!(flow = %flow.key, "flow has fewer than two sequence numbers, omitted");
                summary.omitted = Some(Omission::TooFewSequenceNumbers);
            }
        }
        summaries.push(summary);
    }

    let report = ExtractReport {
        path: path.to_path_buf(),
        strategy,
        frames: capture.frames,
        records: capture.records.len(),
        parse_errors: capture.parse_errors,
        skipped,
        flows: summaries,
    };
    tracing::info!(
        path = %path.display(),
        flows = report.flows.len(),
        files = report.files_written(),
        skipped,
        "extraction finished"
    );
    Ok(report)
}

pub fn write_report_json(
    path: &Path,
    reports: &[ExtractReport],
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports)?;
    Ok(())
}
