use crate::plot::OutputFormat;
use crate::sequence::SequenceMode;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// cpdv-extract: write consecutive packet delay differences of every flow in
/// a capture to `cpdv_flow<N>.tsv` files next to it
#[derive(Parser, Debug)]
#[command(name = "cpdv-extract", version, about)]
pub struct ExtractCli {
    /// Where sequence numbers come from: the TCP header, the first four
    /// bytes of the UDP payload, or whichever the first packet carries
    #[arg(value_enum)]
    pub mode: SequenceMode,

    /// Capture files to process
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Export extraction reports as JSON (empty to disable)
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

/// cpdv-diagram: plot consecutive packet delay differences
#[derive(Parser, Debug)]
#[command(name = "cpdv-diagram", version, about)]
pub struct DiagramCli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: DiagramCommand,
}

#[derive(Subcommand, Debug)]
pub enum DiagramCommand {
    /// One scatter plot of raw deltas per file
    Points(PointsArgs),
    /// One combined histogram of all given data sets
    Distribution(DistributionArgs),
}

#[derive(Args, Debug)]
pub struct PointsArgs {
    /// TSV files to plot
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Marker size
    #[arg(short, long)]
    pub marker: Option<f64>,

    /// Show the plots instead of writing them to files
    #[arg(short, long)]
    pub show: bool,

    /// Artifact format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("inputs").required(true).args(["dirs", "tsv"])))]
pub struct DistributionArgs {
    /// Bin size in ms
    #[arg(short, long)]
    pub binsize: Option<f64>,

    /// Only bin values between the (100 - P)th and Pth percentile
    #[arg(short, long, conflicts_with = "limits")]
    pub percentile: Option<u8>,

    /// Only bin values between LOW and HIGH
    #[arg(short, long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true)]
    pub limits: Option<Vec<f64>>,

    /// Drop out-of-range values instead of counting them in the outer bins
    #[arg(short = 'c', long)]
    pub noclip: bool,

    /// Count out-of-range values in the outer bins
    #[arg(long, conflicts_with = "noclip")]
    pub clip: bool,

    /// Directories each holding a TSV file named by --filename
    #[arg(short, long, num_args = 1..)]
    pub dirs: Vec<PathBuf>,

    /// TSV files
    #[arg(short, long, num_args = 1..)]
    pub tsv: Vec<PathBuf>,

    /// File name looked up in each directory
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Show the plot instead of writing it to a file
    #[arg(short, long)]
    pub show: bool,

    /// Artifact format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}
