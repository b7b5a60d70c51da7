//! Plot construction and rendering.
//!
//! Plots are plain [`plotly::Plot`] values built from delta series or a
//! binned [`Distribution`], then either written to a file or opened in a
//! browser.

use crate::binning::Distribution;
use crate::delta::DeltaSeries;
use plotly::common::{Marker, Mode, Title};
use plotly::layout::{Axis, BarMode};
use plotly::{Bar, Layout, Plot, Scatter};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the distribution artifact, without extension.
pub const DISTRIBUTION_STEM: &str = "cpdv_dist";

#[derive(Debug)]
pub enum PlotError {
    Io { path: PathBuf, source: std::io::Error },
    /// The kaleido exporter failed.
    Export { path: PathBuf, message: String },
    /// PDF output requested from a build without the `kaleido` feature.
    PdfUnavailable,
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            PlotError::Export { path, message } => {
                write!(f, "{}: PDF export failed: {}", path.display(), message)
            }
            PlotError::PdfUnavailable => write!(
                f,
                "PDF output requires building with the `kaleido` feature; use --format html"
            ),
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Io { source, .. } => Some(source),
            PlotError::Export { .. } | PlotError::PdfUnavailable => None,
        }
    }
}

/// Artifact file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Html,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where a finished plot goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Open in the default browser.
    Show,
    Save(PathBuf),
}

/// Image settings for saved artifacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub format: OutputFormat,
    pub width: usize,
    pub height: usize,
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas {
            format: OutputFormat::default(),
            width: 800,
            height: 600,
        }
    }
}

/// Artifact path of a points plot: the input path with its extension replaced.
pub fn points_artifact(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.extension())
}

/// Artifact path of a distribution plot, relative to the working directory.
pub fn distribution_artifact(format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", DISTRIBUTION_STEM, format.extension()))
}

/// Scatter of raw deltas against their row index.
pub fn points_plot(series: &DeltaSeries, marker_size: f64) -> Plot {
    let x: Vec<usize> = (0..series.len()).collect();
    let size = marker_size.round().max(1.0) as usize;

    let trace = Scatter::new(x, series.deltas())
        .mode(Mode::Markers)
        .marker(Marker::new().size(size))
        .name(series.label());

    let layout = Layout::new()
        .title(Title::new("Consecutive packet delay difference"))
        .x_axis(Axis::new().title(Title::new("Packet number")))
        .y_axis(Axis::new().title(Title::new("Delta delay")))
        .show_legend(false);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

/// Bars of every series side by side within each shared bin.
pub fn distribution_plot(dist: &Distribution, clip: bool) -> Plot {
    let mut plot = Plot::new();
    for (i, hist) in dist.histograms.iter().enumerate() {
        let offset = dist.bar_offset(i);
        let x: Vec<f64> = hist.bins.iter().map(|&(left, _)| left + offset).collect();
        let trace = Bar::new(x, hist.ratios()).name(hist.label.as_str());
        plot.add_trace(trace);
    }

    // plotly sizes overlaid bars from the bin spacing; the gap leaves each
    // series `bin_size / n` wide
    let series = dist.histograms.len().max(1) as f64;
    let mut x_axis = Axis::new().title(Title::new("Delay differences [ms]"));
    if clip {
        let (values, labels) = clip_ticks(dist);
        x_axis = x_axis.tick_values(values).tick_text(labels);
    }

    let layout = Layout::new()
        .title(Title::new("Distribution of consecutive packet delay difference"))
        .x_axis(x_axis)
        .y_axis(Axis::new().title(Title::new("Ratio")))
        .bar_mode(BarMode::Overlay)
        .bar_gap(1.0 - 1.0 / series);
    plot.set_layout(layout);
    plot
}

const MAX_TICK_DECIMALS: usize = 3;

/// Fewest decimals (up to three) that print `value` without float noise.
fn tick_decimals(value: f64) -> usize {
    (0..MAX_TICK_DECIMALS)
        .find(|&d| {
            let scaled = value * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(MAX_TICK_DECIMALS)
}

/// Tick positions and labels for a clipped distribution.
///
/// `low` and `high` always get a tick, marked as collecting everything
/// beyond them. Bin edges in between are ticked unless they sit within half
/// a bin of either boundary.
pub fn clip_ticks(dist: &Distribution) -> (Vec<f64>, Vec<String>) {
    let decimals = [dist.bin_size, dist.low, dist.high]
        .into_iter()
        .map(tick_decimals)
        .max()
        .unwrap_or(0);
    let margin = dist.bin_size / 2.0;

    let mut values = vec![dist.low];
    let mut labels = vec![format!("≤{:.*}", decimals, dist.low)];
    for &edge in &dist.edges {
        if edge - dist.low >= margin && dist.high - edge >= margin {
            values.push(edge);
            labels.push(format!("{:.*}", decimals, edge));
        }
    }
    values.push(dist.high);
    labels.push(format!("≥{:.*}", decimals, dist.high));
    (values, labels)
}

/// Show or save a plot.
pub fn render(plot: &Plot, output: &Output, canvas: &Canvas) -> Result<(), PlotError> {
    match output {
        Output::Show => {
            plot.show();
            Ok(())
        }
        Output::Save(path) => {
            match canvas.format {
                OutputFormat::Html => {
                    std::fs::write(path, plot.to_html()).map_err(|source| PlotError::Io {
                        path: path.clone(),
                        source,
                    })?;
                }
                OutputFormat::Pdf => write_pdf(plot, path, canvas)?,
            }
            tracing::info!(path = %path.display(), format = %canvas.format, "plot written");
            Ok(())
        }
    }
}

#[cfg(feature = "kaleido")]
fn write_pdf(plot: &Plot, path: &Path, canvas: &Canvas) -> Result<(), PlotError> {
    let export_err = |message: String| PlotError::Export {
        path: path.to_path_buf(),
        message,
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if !dir.is_dir() {
            return Err(PlotError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "output directory does not exist",
                ),
            });
        }
    }

    let data: serde_json::Value =
        serde_json::from_str(&plot.to_json()).map_err(|err| export_err(err.to_string()))?;

    // Kaleido::new panics when its bundled executable is missing
    let kaleido = std::panic::catch_unwind(plotly_kaleido::Kaleido::new)
        .map_err(|_| export_err("kaleido executable not found".into()))?;
    kaleido
        .save(path, &data, "pdf", canvas.width, canvas.height, 1.0)
        .map_err(|err| export_err(err.to_string()))
}

#[cfg(not(feature = "kaleido"))]
fn write_pdf(_plot: &Plot, _path: &Path, _canvas: &Canvas) -> Result<(), PlotError> {
    Err(PlotError::PdfUnavailable)
}
