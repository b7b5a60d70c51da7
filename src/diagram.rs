//! Plotting driver: resolves inputs, loads series, builds and renders plots.

use crate::binning::{self, BinError, DistributionConfig};
use crate::delta::DeltaSeries;
use crate::display;
use crate::plot::{self, Canvas, Output, PlotError};
use crate::tsv::{self, TsvError};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum InputError {
    NotADirectory(PathBuf),
    MissingFile { dir: PathBuf, filename: String },
    NotAFile(PathBuf),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NotADirectory(dir) => {
                write!(f, "`{}` is not a valid directory", dir.display())
            }
            InputError::MissingFile { dir, filename } => write!(
                f,
                "`{}` does not contain a `{}` file",
                dir.display(),
                filename
            ),
            InputError::NotAFile(path) => write!(f, "`{}` is not a readable file", path.display()),
        }
    }
}

impl std::error::Error for InputError {}

#[derive(Debug)]
pub enum DiagramError {
    Input(InputError),
    Tsv(TsvError),
    Bin(BinError),
    Plot(PlotError),
}

impl fmt::Display for DiagramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramError::Input(err) => write!(f, "{}", err),
            DiagramError::Tsv(err) => write!(f, "{}", err),
            DiagramError::Bin(err) => write!(f, "{}", err),
            DiagramError::Plot(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DiagramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiagramError::Input(err) => Some(err),
            DiagramError::Tsv(err) => Some(err),
            DiagramError::Bin(err) => Some(err),
            DiagramError::Plot(err) => Some(err),
        }
    }
}

impl From<InputError> for DiagramError {
    fn from(err: InputError) -> Self {
        DiagramError::Input(err)
    }
}

impl From<TsvError> for DiagramError {
    fn from(err: TsvError) -> Self {
        DiagramError::Tsv(err)
    }
}

impl From<BinError> for DiagramError {
    fn from(err: BinError) -> Self {
        DiagramError::Bin(err)
    }
}

impl From<PlotError> for DiagramError {
    fn from(err: PlotError) -> Self {
        DiagramError::Plot(err)
    }
}

/// Data sets for a distribution plot.
#[derive(Debug, Clone)]
pub enum Inputs {
    /// Directories each holding a file of the configured name.
    Dirs(Vec<PathBuf>),
    Files(Vec<PathBuf>),
}

/// A TSV file together with its legend label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub label: String,
}

fn file_label(path: &Path) -> String {
    let name = path.to_string_lossy();
    name.strip_suffix(".tsv").unwrap_or(&name).to_string()
}

fn dir_label(dir: &Path) -> String {
    let name = dir.to_string_lossy();
    let trimmed = name.trim_end_matches(std::path::is_separator);
    if trimmed.is_empty() {
        name.into_owned()
    } else {
        trimmed.to_string()
    }
}

/// Check every input and attach its label. Nothing is read yet; the first
/// invalid input fails the whole batch.
pub fn resolve_inputs(inputs: &Inputs, filename: &str) -> Result<Vec<InputFile>, InputError> {
    match inputs {
        Inputs::Files(files) => files
            .iter()
            .map(|path| {
                if !path.is_file() {
                    return Err(InputError::NotAFile(path.clone()));
                }
                Ok(InputFile {
                    path: path.clone(),
                    label: file_label(path),
                })
            })
            .collect(),
        Inputs::Dirs(dirs) => {
            for dir in dirs {
                if !dir.is_dir() {
                    return Err(InputError::NotADirectory(dir.clone()));
                }
            }
            dirs.iter()
                .map(|dir| {
                    let path = dir.join(filename);
                    if !path.is_file() {
                        return Err(InputError::MissingFile {
                            dir: dir.clone(),
                            filename: filename.to_string(),
                        });
                    }
                    Ok(InputFile {
                        path,
                        label: dir_label(dir),
                    })
                })
                .collect()
        }
    }
}

fn load(inputs: &[InputFile]) -> Result<Vec<DeltaSeries>, TsvError> {
    inputs
        .iter()
        .map(|input| tsv::read_series(&input.path, input.label.as_str()))
        .collect()
}

/// Draw one points plot per file. Returns the artifacts written.
pub fn run_points(
    files: &[PathBuf],
    marker_size: f64,
    show: bool,
    canvas: &Canvas,
    verbose: bool,
) -> Result<Vec<PathBuf>, DiagramError> {
    let inputs = resolve_inputs(&Inputs::Files(files.to_vec()), "")?;
    let series = load(&inputs)?;

    let mut written = Vec::new();
    for (input, series) in inputs.iter().zip(&series) {
        let plot = plot::points_plot(series, marker_size);
        if show {
            plot::render(&plot, &Output::Show, canvas)?;
            continue;
        }

        if verbose {
            display::print_progress_start("Plotting", &input.path);
        }
        let artifact = plot::points_artifact(&input.path, canvas.format);
        plot::render(&plot, &Output::Save(artifact.clone()), canvas)?;
        if verbose {
            display::print_progress_done();
        }
        written.push(artifact);
    }
    Ok(written)
}

/// Bin all inputs over a shared range and draw them in one plot.
pub fn run_distribution(
    inputs: &Inputs,
    filename: &str,
    config: &DistributionConfig,
    output: &Output,
    canvas: &Canvas,
    verbose: bool,
) -> Result<binning::Distribution, DiagramError> {
    let inputs = resolve_inputs(inputs, filename)?;
    let series = load(&inputs)?;
    let dist = binning::bin(&series, config)?;

    if verbose {
        display::print_distribution_summary(&dist);
    }

    let plot = plot::distribution_plot(&dist, config.clip);
    let progress = match output {
        Output::Save(path) if verbose => Some(path),
        _ => None,
    };
    if let Some(path) = progress {
        display::print_progress_start("Writing", path);
    }
    plot::render(&plot, output, canvas)?;
    if progress.is_some() {
        display::print_progress_done();
    }
    Ok(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::RangeSource;
    use crate::plot::OutputFormat;
    use std::fs;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path =
                std::env::temp_dir().join(format!("cpdv-diagram-{}-{}", name, std::process::id()));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(&path).unwrap();
            TempDir(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn html_canvas() -> Canvas {
        Canvas {
            format: OutputFormat::Html,
            ..Canvas::default()
        }
    }

    #[test]
    fn labels() {
        assert_eq!(file_label(Path::new("runs/a/cpdv_flow0.tsv")), "runs/a/cpdv_flow0");
        assert_eq!(file_label(Path::new("data.txt")), "data.txt");
        assert_eq!(dir_label(Path::new("run1/")), "run1");
        assert_eq!(dir_label(Path::new("run1")), "run1");
    }

    #[test]
    fn directories_are_checked_before_files() {
        let tmp = TempDir::new("dirs");
        let good = tmp.0.join("good");
        let empty = tmp.0.join("empty");
        fs::create_dir_all(&good).unwrap();
        fs::create_dir_all(&empty).unwrap();
        fs::write(good.join("cpdv_flow0.tsv"), "1\t2.0\n").unwrap();

        let err = resolve_inputs(
            &Inputs::Dirs(vec![good.clone(), empty.clone()]),
            "cpdv_flow0.tsv",
        )
        .unwrap_err();
        match err {
            InputError::MissingFile { dir, filename } => {
                assert_eq!(dir, empty);
                assert_eq!(filename, "cpdv_flow0.tsv");
            }
            other => panic!("unexpected error: {}", other),
        }

        let err = resolve_inputs(
            &Inputs::Dirs(vec![empty, tmp.0.join("absent")]),
            "cpdv_flow0.tsv",
        )
        .unwrap_err();
        assert!(matches!(err, InputError::NotADirectory(_)));

        let resolved = resolve_inputs(&Inputs::Dirs(vec![good.clone()]), "cpdv_flow0.tsv").unwrap();
        assert_eq!(resolved[0].path, good.join("cpdv_flow0.tsv"));
    }

    #[test]
    fn missing_tsv_file_is_reported() {
        let err = resolve_inputs(&Inputs::Files(vec![PathBuf::from("/nonexistent.tsv")]), "")
            .unwrap_err();
        assert!(matches!(err, InputError::NotAFile(_)));
    }

    #[test]
    fn points_artifact_lands_next_to_input() {
        let tmp = TempDir::new("points");
        let input = tmp.0.join("cpdv_flow0.tsv");
        fs::write(&input, "2\t1.5\n3\t-0.5\n4\t2.0\n").unwrap();

        let written = run_points(&[input], 2.5, false, &html_canvas(), false).unwrap();
        assert_eq!(written, vec![tmp.0.join("cpdv_flow0.html")]);
        assert!(written[0].is_file());
    }

    #[test]
    fn distribution_of_two_directories() {
        let tmp = TempDir::new("dist");
        let a = tmp.0.join("a");
        let b = tmp.0.join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("flow.tsv"), "1\t2.0\n2\t5.0\n3\t8.0\n").unwrap();
        fs::write(b.join("flow.tsv"), "1\t3.0\n2\t6.0\n3\t9.0\n").unwrap();

        let config = DistributionConfig {
            bin_size: 1.0,
            range: RangeSource::Percentile(100),
            clip: true,
        };
        let artifact = tmp.0.join("cpdv_dist.html");
        let dist = run_distribution(
            &Inputs::Dirs(vec![a, b]),
            "flow.tsv",
            &config,
            &Output::Save(artifact.clone()),
            &html_canvas(),
            false,
        )
        .unwrap();
        assert_eq!((dist.low, dist.high), (2.0, 9.0));
        assert_eq!(dist.histograms.len(), 2);
        assert!(artifact.is_file());
    }

    #[test]
    fn malformed_input_fails_before_plotting() {
        let tmp = TempDir::new("bad");
        let input = tmp.0.join("bad.tsv");
        fs::write(&input, "not a row\n").unwrap();
        let err = run_points(&[input], 1.0, false, &html_canvas(), false).unwrap_err();
        assert!(matches!(err, DiagramError::Tsv(_)));
        assert!(!tmp.0.join("bad.html").exists());
    }
}
