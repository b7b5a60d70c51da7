//! Human-readable progress and summaries for the CLI.
//!
//! Only used in verbose mode; structured diagnostics go through `tracing`.

use crate::binning::Distribution;
use crate::extract::{ExtractReport, FlowSummary, Omission};
use std::io::Write;
use std::path::Path;

/// Print `"<action> <path>... "` without a newline.
pub fn print_progress_start(action: &str, path: &Path) {
    print!("{} {}... ", action, path.display());
    let _ = std::io::stdout().flush();
}

pub fn print_progress_done() {
    println!("done.");
}

/// One line of the flow listing.
pub fn format_flow_line(flow: &FlowSummary) -> String {
    format!("\t{}: {} - {} packets", flow.index, flow.key, flow.packets)
}

/// Print the flows of a processed capture.
pub fn print_flow_listing(report: &ExtractReport) {
    println!(
        "{} flows in {} ({} frames, {} TCP/UDP, {} without sequence number):",
        report.flows.len(),
        report.path.display(),
        report.frames,
        report.records,
        report.skipped
    );
    for flow in &report.flows {
        let line = format_flow_line(flow);
        match flow.omitted {
            Some(Omission::TooFewSequenceNumbers) => {
                println!("{} (omitted: fewer than two sequence numbers)", line)
            }
            None => println!("{}", line),
        }
    }
}

/// Format the shared range and per-series retention of a distribution.
pub fn format_distribution_summary(dist: &Distribution) -> Vec<String> {
    let mut lines = vec![format!(
        "Range [{}, {}] in {} bins of {} ms",
        dist.low,
        dist.high,
        dist.edges.len().saturating_sub(1),
        dist.bin_size
    )];
    for hist in &dist.histograms {
        lines.push(format!(
            "\t{}: {}/{} values binned",
            hist.label, hist.retained, hist.total
        ));
    }
    lines
}

pub fn print_distribution_summary(dist: &Distribution) {
    for line in format_distribution_summary(dist) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::HistogramResult;
    use crate::flow::{Endpoint, FlowKey};

    #[test]
    fn flow_line_format() {
        let flow = FlowSummary {
            index: 3,
            key: FlowKey::new(
                Endpoint {
                    ip: "10.0.0.1".parse().unwrap(),
                    port: 5001,
                },
                Endpoint {
                    ip: "10.0.0.2".parse().unwrap(),
                    port: 5201,
                },
            ),
            packets: 42,
            sequence_numbers: 40,
            rows: 39,
            output: None,
            omitted: None,
        };
        assert_eq!(
            format_flow_line(&flow),
            "\t3: 10.0.0.1:5001->10.0.0.2:5201 - 42 packets"
        );
    }

    #[test]
    fn distribution_summary_lists_every_series() {
        let dist = Distribution {
            low: 0.0,
            high: 2.0,
            bin_size: 1.0,
            edges: vec![0.0, 1.0, 2.0, 3.0],
            histograms: vec![HistogramResult {
                label: "run1".into(),
                bins: vec![(0.0, 0.5), (1.0, 0.5), (2.0, 0.0)],
                retained: 2,
                total: 3,
            }],
        };
        let lines = format_distribution_summary(&dist);
        assert_eq!(lines[0], "Range [0, 2] in 3 bins of 1 ms");
        assert_eq!(lines[1], "\trun1: 2/3 values binned");
    }
}
