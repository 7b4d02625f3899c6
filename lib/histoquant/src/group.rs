//! Grouping bucket series into histograms.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    bucket::{Bucket, BucketError, BucketSet},
    fingerprint::Fingerprint,
    labels::{ExcludedLabels, LabelSet, BUCKET_LABEL},
    quantile::quantile,
};

/// The buckets of a single histogram, along with the labels identifying it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistogramGroup {
    identity: LabelSet,
    buckets: BucketSet,
}

impl HistogramGroup {
    /// Creates an empty `HistogramGroup` with the given identity.
    ///
    /// The identity is used as-is, so it should already be stripped of the metric name and bucket labels.
    pub fn new(identity: LabelSet) -> Self {
        Self {
            identity,
            buckets: BucketSet::new(),
        }
    }

    /// Creates an empty `HistogramGroup` from the labels of one of its series.
    ///
    /// Excluded labels are removed to form the identity of the group.
    pub fn from_series(labels: &LabelSet, excluded: &ExcludedLabels) -> Self {
        Self::new(labels.without(excluded))
    }

    /// Returns the labels identifying this histogram.
    pub fn identity(&self) -> &LabelSet {
        &self.identity
    }

    /// Returns the buckets collected so far, in their current order.
    pub fn buckets(&self) -> &BucketSet {
        &self.buckets
    }

    /// Adds a bucket to the histogram.
    pub fn push_bucket(&mut self, bucket: Bucket) {
        self.buckets.push(bucket);
    }

    /// Estimates the value at quantile `q`.
    ///
    /// The buckets of this group are sorted by upper bound as a side effect. See [`quantile`] for the estimation rules.
    pub fn quantile(&mut self, q: f64) -> f64 {
        quantile(q, self.buckets.as_mut_slice())
    }

    /// Consumes the group, returning its identity and buckets.
    pub fn into_parts(self) -> (LabelSet, BucketSet) {
        (self.identity, self.buckets)
    }
}

/// Collects bucket series into histograms.
///
/// Each sample is keyed by the fingerprint of its labels, so all bucket series of one histogram, which differ only in
/// their metric name and bucket labels, end up in the same [`HistogramGroup`]. Groups are kept in the order their first
/// sample was seen.
///
/// Samples whose bucket label is missing or unparseable are skipped.
#[derive(Debug)]
pub struct HistogramGrouper {
    bucket_label: String,
    excluded: ExcludedLabels,
    groups: IndexMap<Fingerprint, HistogramGroup>,
    skipped: usize,
}

impl HistogramGrouper {
    /// Creates a new `HistogramGrouper` with the given bucket label and exclusions.
    ///
    /// `excluded` should include `bucket_label`, otherwise every bucket ends up in a group of its own.
    pub fn new<S>(bucket_label: S, excluded: ExcludedLabels) -> Self
    where
        S: Into<String>,
    {
        Self {
            bucket_label: bucket_label.into(),
            excluded,
            groups: IndexMap::new(),
            skipped: 0,
        }
    }

    /// Adds a single bucket sample.
    ///
    /// ## Errors
    ///
    /// If the sample has no bucket label, or its value is not a number, an error is returned and the sample is not
    /// added.
    pub fn try_push(&mut self, labels: &LabelSet, count: f64) -> Result<Fingerprint, BucketError> {
        let bucket = match labels.get(self.bucket_label.as_str()) {
            Some(bound) => Bucket::from_bound_label(&self.bucket_label, bound, count)?,
            None => {
                return Err(BucketError::MissingBucketLabel {
                    label: self.bucket_label.clone(),
                })
            }
        };

        let fingerprint = labels.fingerprint(&self.excluded);
        self.groups
            .entry(fingerprint)
            .or_insert_with(|| HistogramGroup::from_series(labels, &self.excluded))
            .push_bucket(bucket);

        Ok(fingerprint)
    }

    /// Adds a single bucket sample, skipping it if it cannot be turned into a bucket.
    pub fn push(&mut self, labels: &LabelSet, count: f64) {
        if let Err(e) = self.try_push(labels, count) {
            debug!(error = %e, labels = %labels, "Skipping invalid histogram bucket sample.");
            self.skipped += 1;
        }
    }

    /// Returns the number of samples skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the number of histograms collected so far.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no histograms have been collected.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Gets the histogram with the given fingerprint.
    pub fn get(&self, fingerprint: Fingerprint) -> Option<&HistogramGroup> {
        self.groups.get(&fingerprint)
    }

    /// Estimates the value at quantile `q` for every collected histogram.
    ///
    /// Yields the identity of each histogram along with its estimate, in the order histograms were first seen.
    pub fn quantiles(self, q: f64) -> impl Iterator<Item = (LabelSet, f64)> {
        self.groups.into_values().map(move |group| {
            let (identity, buckets) = group.into_parts();
            (identity, buckets.quantile(q))
        })
    }

    /// Consumes the grouper, returning the collected histograms.
    pub fn into_groups(self) -> impl Iterator<Item = (Fingerprint, HistogramGroup)> {
        self.groups.into_iter()
    }
}

impl Default for HistogramGrouper {
    fn default() -> Self {
        Self::new(BUCKET_LABEL, ExcludedLabels::default())
    }
}

impl<'a> Extend<(&'a LabelSet, f64)> for HistogramGrouper {
    fn extend<I: IntoIterator<Item = (&'a LabelSet, f64)>>(&mut self, iter: I) {
        for (labels, count) in iter {
            self.push(labels, count);
        }
    }
}
