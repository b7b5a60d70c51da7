//! Shared-range histogram binning of several delta series.
//!
//! All series are counted over one set of uniform bin edges so their
//! distributions can be drawn side by side. Each histogram is normalized by
//! the number of values of that series that actually landed in a bin.

use crate::delta::DeltaSeries;
use serde::Serialize;
use std::fmt;

/// Upper bound on the number of bin edges of one distribution.
pub const MAX_EDGES: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum BinError {
    NoSeries,
    EmptySeries(String),
    InvalidBinSize(f64),
    InvalidPercentile(u8),
    InvalidRange { low: f64, high: f64 },
    TooManyBins { edges: f64 },
}

impl fmt::Display for BinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinError::NoSeries => write!(f, "no data series given"),
            BinError::EmptySeries(label) => write!(f, "series `{}` contains no values", label),
            BinError::InvalidBinSize(size) => {
                write!(f, "bin size must be a positive number, got {}", size)
            }
            BinError::InvalidPercentile(p) => {
                write!(f, "percentile must be between 0 and 100, got {}", p)
            }
            BinError::InvalidRange { low, high } => {
                write!(f, "invalid value range [{}, {}]", low, high)
            }
            BinError::TooManyBins { edges } => write!(
                f,
                "bin size too small for the value range: {} bin edges (max {})",
                edges, MAX_EDGES
            ),
        }
    }
}

impl std::error::Error for BinError {}

/// Where the shared bin range comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSource {
    /// Use `[percentile(100 - p), percentile(p)]` of every series, combined
    /// with min/max across series.
    Percentile(u8),
    /// Fixed `[low, high]`.
    Limits { low: f64, high: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionConfig {
    pub bin_size: f64,
    pub range: RangeSource,
    /// Force out-of-range values onto the range boundary instead of dropping them.
    pub clip: bool,
}

/// Normalized histogram of one series over the shared edges.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramResult {
    pub label: String,
    /// `(left edge, ratio)` per bin.
    pub bins: Vec<(f64, f64)>,
    /// Values that fell into some bin.
    pub retained: usize,
    /// Values in the series.
    pub total: usize,
}

impl HistogramResult {
    pub fn ratios(&self) -> Vec<f64> {
        self.bins.iter().map(|&(_, ratio)| ratio).collect()
    }
}

/// Result of binning several series together.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub low: f64,
    pub high: f64,
    pub bin_size: f64,
    pub edges: Vec<f64>,
    /// Histograms in input order; the position is the series index used for
    /// bar offsets.
    pub histograms: Vec<HistogramResult>,
}

impl Distribution {
    /// Width of one series' bar when all series share a bin.
    pub fn bar_width(&self) -> f64 {
        self.bin_size / self.histograms.len().max(1) as f64
    }

    /// Horizontal offset of series `index` within a bin.
    pub fn bar_offset(&self, index: usize) -> f64 {
        self.bar_width() * index as f64
    }
}

/// Percentile with linear interpolation between order statistics.
///
/// `sorted` must be ascending and non-empty; `p` is in `[0, 100]`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Shared `(low, high)` over all series for the given range source.
pub fn resolve_range(series: &[DeltaSeries], range: RangeSource) -> Result<(f64, f64), BinError> {
    let (low, high) = match range {
        RangeSource::Limits { low, high } => (low, high),
        RangeSource::Percentile(p) => {
            if p > 100 {
                return Err(BinError::InvalidPercentile(p));
            }
            if series.is_empty() {
                return Err(BinError::NoSeries);
            }
            let mut low = f64::INFINITY;
            let mut high = f64::NEG_INFINITY;
            for s in series {
                let mut values = s.deltas();
                if values.is_empty() {
                    return Err(BinError::EmptySeries(s.label().to_string()));
                }
                values.sort_by(f64::total_cmp);
                low = low.min(percentile(&values, f64::from(100 - p)));
                high = high.max(percentile(&values, f64::from(p)));
            }
            (low, high)
        }
    };

    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(BinError::InvalidRange { low, high });
    }
    Ok((low, high))
}

/// Uniform edges from `low` in steps of `bin_size`, stopping before
/// `high + 2 * bin_size`. The bin holding `high` is never the last one.
pub fn bin_edges(low: f64, high: f64, bin_size: f64) -> Vec<f64> {
    let count = edge_count(low, high, bin_size) as usize;
    (0..count).map(|i| low + i as f64 * bin_size).collect()
}

fn edge_count(low: f64, high: f64, bin_size: f64) -> f64 {
    ((high + 2.0 * bin_size - low) / bin_size).ceil().max(0.0)
}

/// Count `values` into the bins described by `edges`.
///
/// Bins are half-open `[e_i, e_{i+1})` except the last, which also includes
/// its right edge. Values outside `[e_0, e_last]` are not counted.
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; bins];
    if bins == 0 {
        return counts;
    }
    let first = edges[0];
    let last = edges[bins];
    for &v in values {
        if v.is_nan() || v < first || v > last {
            continue;
        }
        let idx = edges.partition_point(|&e| e <= v).saturating_sub(1).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Bin every series over a shared range.
pub fn bin(series: &[DeltaSeries], config: &DistributionConfig) -> Result<Distribution, BinError> {
    if series.is_empty() {
        return Err(BinError::NoSeries);
    }
    if !(config.bin_size.is_finite() && config.bin_size > 0.0) {
        return Err(BinError::InvalidBinSize(config.bin_size));
    }

    let (low, high) = resolve_range(series, config.range)?;
    let edges = edge_count(low, high, config.bin_size);
    if edges > MAX_EDGES as f64 {
        return Err(BinError::TooManyBins { edges });
    }
    let edges = bin_edges(low, high, config.bin_size);
    tracing::debug!(low, high, bins = edges.len().saturating_sub(1), "bin range resolved");

    let histograms = series
        .iter()
        .map(|s| {
            let mut values = s.deltas();
            if config.clip {
                for v in values.iter_mut() {
                    *v = v.clamp(low, high);
                }
            }
            let counts = histogram(&values, &edges);
            let retained: usize = counts.iter().sum();
            if retained < values.len() {
                tracing::debug!(
                    series = s.label(),
                    dropped = values.len() - retained,
                    "values outside bin range"
                );
            }
            let bins = edges
                .iter()
                .zip(&counts)
                .map(|(&left, &count)| {
                    let ratio = if retained > 0 {
                        count as f64 / retained as f64
                    } else {
                        0.0
                    };
                    (left, ratio)
                })
                .collect();
            HistogramResult {
                label: s.label().to_string(),
                bins,
                retained,
                total: values.len(),
            }
        })
        .collect();

    Ok(Distribution {
        low,
        high,
        bin_size: config.bin_size,
        edges,
        histograms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::DeltaRow;

    fn series(label: &str, values: &[f64]) -> DeltaSeries {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, &delta_ms)| DeltaRow {
                seq: i as i64,
                delta_ms,
            })
            .collect();
        DeltaSeries::new(label, rows)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_close(percentile(&sorted, 0.0), 1.0);
        assert_close(percentile(&sorted, 100.0), 4.0);
        assert_close(percentile(&sorted, 50.0), 2.5);
        assert_close(percentile(&sorted, 90.0), 3.7);
        assert_close(percentile(&[7.0], 35.0), 7.0);
    }

    #[test]
    fn percentile_range_takes_min_low_and_max_high() {
        let a = series("a", &[2.0, 5.0, 8.0]);
        let b = series("b", &[3.0, 6.0, 9.0]);
        assert_eq!(
            resolve_range(&[a, b], RangeSource::Percentile(100)).unwrap(),
            (2.0, 9.0)
        );
    }

    #[test]
    fn percentile_range_trims_tails() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let s = series("s", &values);
        let (low, high) = resolve_range(&[s], RangeSource::Percentile(95)).unwrap();
        assert_close(low, 5.0);
        assert_close(high, 95.0);
    }

    #[test]
    fn explicit_limits_are_used_verbatim() {
        let s = series("s", &[100.0]);
        assert_eq!(
            resolve_range(&[s], RangeSource::Limits { low: -3.0, high: 4.5 }).unwrap(),
            (-3.0, 4.5)
        );
        assert!(matches!(
            resolve_range(&[], RangeSource::Limits { low: 2.0, high: 1.0 }),
            Err(BinError::InvalidRange { .. })
        ));
    }

    #[test]
    fn edges_extend_one_bin_past_high() {
        assert_eq!(bin_edges(0.0, 3.0, 1.0), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(bin_edges(2.0, 2.0, 1.0), vec![2.0, 3.0]);
        assert_eq!(bin_edges(0.0, 1.0, 0.5), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn histogram_bins_are_half_open_except_last() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(histogram(&[0.0, 0.5, 1.0, 1.5, 2.0], &edges), vec![2, 3]);
        assert_eq!(histogram(&[-0.1, 2.1], &edges), vec![0, 0]);
    }

    #[test]
    fn clipped_ratios_sum_to_one() {
        let config = DistributionConfig {
            bin_size: 1.0,
            range: RangeSource::Limits { low: 0.0, high: 2.0 },
            clip: true,
        };
        let dist = bin(&[series("s", &[-5.0, 0.5, 1.5, 2.0, 40.0])], &config).unwrap();
        let h = &dist.histograms[0];
        assert_eq!(h.retained, 5);
        assert_close(h.ratios().iter().sum(), 1.0);
        // -5 clipped into the first bin, 2.0 and 40 into the bin starting at high
        assert_close(h.bins[0].1, 0.4);
        assert_close(h.bins[2].1, 0.4);
        assert_eq!(h.bins[2].0, 2.0);
    }

    #[test]
    fn unclipped_out_of_range_values_are_dropped() {
        let config = DistributionConfig {
            bin_size: 1.0,
            range: RangeSource::Limits { low: 0.0, high: 1.0 },
            clip: false,
        };
        let dist = bin(&[series("s", &[-1.0, 0.5, 0.7, 1.2, 9.0])], &config).unwrap();
        let h = &dist.histograms[0];
        assert_eq!(h.total, 5);
        assert_eq!(h.retained, 3);
        assert_close(h.ratios().iter().sum(), 1.0);
        assert_close(h.bins[0].1, 2.0 / 3.0);
    }

    #[test]
    fn each_series_normalized_by_its_own_count() {
        let config = DistributionConfig {
            bin_size: 1.0,
            range: RangeSource::Percentile(100),
            clip: true,
        };
        let dist = bin(
            &[series("few", &[0.0, 1.0]), series("many", &[0.0, 0.0, 0.0, 1.0])],
            &config,
        )
        .unwrap();
        assert_eq!(dist.edges, vec![0.0, 1.0, 2.0]);
        assert_close(dist.histograms[0].bins[0].1, 0.5);
        assert_close(dist.histograms[1].bins[0].1, 0.75);
        assert_close(dist.bar_width(), 0.5);
        assert_close(dist.bar_offset(1), 0.5);
    }

    #[test]
    fn rejects_bad_configuration() {
        let s = [series("s", &[1.0])];
        let mut config = DistributionConfig {
            bin_size: 0.0,
            range: RangeSource::Percentile(100),
            clip: true,
        };
        assert_eq!(bin(&s, &config).unwrap_err(), BinError::InvalidBinSize(0.0));
        config.bin_size = 1.0;
        config.range = RangeSource::Percentile(101);
        assert_eq!(bin(&s, &config).unwrap_err(), BinError::InvalidPercentile(101));
        config.range = RangeSource::Percentile(40);
        assert!(matches!(
            bin(&[series("w", &[1.0, 2.0, 3.0])], &config),
            Err(BinError::InvalidRange { .. })
        ));
        config.range = RangeSource::Percentile(90);
        assert!(matches!(
            bin(&[series("e", &[])], &config),
            Err(BinError::EmptySeries(_))
        ));
        assert_eq!(bin(&[], &config).unwrap_err(), BinError::NoSeries);
    }

    #[test]
    fn tiny_bins_over_wide_range_are_rejected() {
        let config = DistributionConfig {
            bin_size: 1e-9,
            range: RangeSource::Limits {
                low: 0.0,
                high: 1000.0,
            },
            clip: true,
        };
        assert!(matches!(
            bin(&[series("s", &[1.0])], &config),
            Err(BinError::TooManyBins { .. })
        ));

        // just under the cap is fine
        let config = DistributionConfig {
            bin_size: 1.0,
            range: RangeSource::Limits {
                low: 0.0,
                high: (MAX_EDGES - 3) as f64,
            },
            clip: true,
        };
        let dist = bin(&[series("s", &[1.0])], &config).unwrap();
        assert_eq!(dist.edges.len(), MAX_EDGES - 1);
    }
}
