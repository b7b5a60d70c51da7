use clap::Parser;
use cpdv::binning::{DistributionConfig, RangeSource};
use cpdv::cli::{DiagramCli, DiagramCommand, DistributionArgs, PointsArgs};
use cpdv::config::Config;
use cpdv::diagram::{self, Inputs};
use cpdv::plot::{self, Canvas, Output};

fn main() {
    let args = DiagramCli::parse();
    cpdv::init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let verbose = args.verbose > 0;
    let result = match &args.command {
        DiagramCommand::Points(points) => run_points(points, &config, verbose),
        DiagramCommand::Distribution(dist) => run_distribution(dist, &config, verbose),
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn canvas(config: &Config, format: Option<plot::OutputFormat>) -> Canvas {
    let mut canvas = config.output.canvas();
    if let Some(format) = format {
        canvas.format = format;
    }
    canvas
}

fn run_points(
    args: &PointsArgs,
    config: &Config,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let canvas = canvas(config, args.format);
    let marker_size = args.marker.unwrap_or(config.points.marker_size);

    let written = diagram::run_points(&args.files, marker_size, args.show, &canvas, verbose)?;
    tracing::info!(plots = written.len(), "points plots finished");
    Ok(())
}

fn run_distribution(
    args: &DistributionArgs,
    config: &Config,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = &config.distribution;

    let range = match (&args.limits, args.percentile) {
        (Some(limits), _) => match limits.as_slice() {
            [low, high] => RangeSource::Limits {
                low: *low,
                high: *high,
            },
            _ => return Err("--limits takes exactly two values".into()),
        },
        (None, Some(p)) => RangeSource::Percentile(p),
        (None, None) => RangeSource::Percentile(settings.percentile),
    };

    let mut clip = settings.clip;
    if args.clip {
        clip = true;
    }
    if args.noclip {
        clip = false;
    }

    let dist_config = DistributionConfig {
        bin_size: args.binsize.unwrap_or(settings.bin_size),
        range,
        clip,
    };

    let inputs = if args.dirs.is_empty() {
        Inputs::Files(args.tsv.clone())
    } else {
        Inputs::Dirs(args.dirs.clone())
    };
    let filename = args.filename.as_deref().unwrap_or(&settings.filename);

    let canvas = canvas(config, args.format);
    let output = if args.show {
        Output::Show
    } else {
        Output::Save(plot::distribution_artifact(canvas.format))
    };

    let dist = diagram::run_distribution(&inputs, filename, &dist_config, &output, &canvas, verbose)?;
    tracing::info!(
        series = dist.histograms.len(),
        low = dist.low,
        high = dist.high,
        "distribution plot finished"
    );
    Ok(())
}
