//! Quantile estimation over cumulative histogram buckets.
//!
//! Histograms in time-series data are commonly stored as one series per bucket, where each bucket series counts the
//! observations less than or equal to its upper bound, carried in a dedicated label (`le`). This crate provides the two
//! pieces needed to turn such series into quantile estimates:
//!
//! - [`fingerprint`], which hashes the labels of a series while ignoring its metric name and bucket labels, so that
//!   every bucket series of one histogram shares a key
//! - [`quantile`], which estimates the value at a given quantile by linear interpolation over the sorted buckets
//!
//! [`HistogramGrouper`] ties the two together for callers that already hold the raw bucket samples.
#![deny(warnings)]
#![deny(missing_docs)]

mod bucket;
pub use self::bucket::{sort_buckets, Bucket, BucketError, BucketSet};

#[cfg(test)]
mod common;

mod config;
pub use self::config::{HistogramConfigurationError, HistogramQuantileConfiguration};

mod fingerprint;
pub use self::fingerprint::{fingerprint, Fingerprint, SEPARATOR_BYTE};

mod group;
pub use self::group::{HistogramGroup, HistogramGrouper};

mod labels;
pub use self::labels::{ExcludedLabels, ExcludedLabelsError, LabelSet, BUCKET_LABEL, METRIC_NAME_LABEL};

mod quantile;
pub use self::quantile::quantile;
