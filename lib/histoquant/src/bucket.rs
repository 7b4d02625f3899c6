//! Cumulative histogram buckets.

use std::num::ParseFloatError;

use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use snafu::{ResultExt as _, Snafu};

use crate::quantile::quantile;

/// An error encountered while building a bucket from a series.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum BucketError {
    /// The series did not carry the bucket boundary label.
    #[snafu(display("Series is missing the bucket label '{}'.", label))]
    MissingBucketLabel {
        /// Name of the bucket label.
        label: String,
    },

    /// The bucket boundary label did not hold a floating-point value.
    #[snafu(display("Bucket label '{}' has invalid upper bound '{}'.", label, value))]
    InvalidBucketBound {
        /// Name of the bucket label.
        label: String,

        /// Raw label value.
        value: String,

        /// Error source.
        source: ParseFloatError,
    },
}

/// A cumulative histogram bucket.
///
/// The count of a bucket includes every observation less than or equal to its upper bound, which means it also
/// includes the counts of all buckets with a lower upper bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bucket {
    /// The upper bound (inclusive) of values in the bucket.
    pub upper_bound: f64,

    /// The cumulative number of values in the bucket.
    pub count: f64,
}

impl Bucket {
    /// Creates a new `Bucket`.
    pub const fn new(upper_bound: f64, count: f64) -> Self {
        Self { upper_bound, count }
    }

    /// Creates a new `Bucket` from the textual value of a bucket boundary label.
    ///
    /// Infinite bounds may be spelled `+Inf`, `Inf`, or `inf`.
    ///
    /// ## Errors
    ///
    /// If `value` is not a valid floating-point number, an error is returned.
    pub fn from_bound_label(label: &str, value: &str, count: f64) -> Result<Self, BucketError> {
        let upper_bound = value.trim().parse::<f64>().context(InvalidBucketBound { label, value })?;
        Ok(Self::new(upper_bound, count))
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.upper_bound.is_infinite() && self.upper_bound.is_sign_positive()
    }
}

/// A set of cumulative histogram buckets.
///
/// Buckets can be added in any order. The set does not enforce unique upper bounds, nor that counts are non-decreasing
/// once sorted, but a well-formed histogram has one bucket per boundary and a final `+Inf` bucket holding the total
/// count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketSet {
    buckets: SmallVec<[Bucket; 16]>,
}

impl BucketSet {
    /// Creates an empty `BucketSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty `BucketSet` with room for at least `capacity` buckets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: SmallVec::with_capacity(capacity),
        }
    }

    /// Adds a bucket to the set.
    pub fn push(&mut self, bucket: Bucket) {
        self.buckets.push(bucket);
    }

    /// Returns the number of buckets in the set.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if the set contains no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Returns an iterator over the buckets in their current order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bucket> {
        self.buckets.iter()
    }

    /// Returns the buckets as a slice, in their current order.
    pub fn as_slice(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Sorts the buckets by upper bound, in ascending order.
    ///
    /// See [`sort_buckets`] for ordering details.
    pub fn sort(&mut self) {
        sort_buckets(&mut self.buckets);
    }

    /// Estimates the value at quantile `q`, consuming the set.
    ///
    /// See [`quantile`] for the estimation rules.
    pub fn quantile(mut self, q: f64) -> f64 {
        quantile(q, &mut self.buckets)
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Bucket] {
        &mut self.buckets
    }
}

impl FromIterator<Bucket> for BucketSet {
    fn from_iter<I: IntoIterator<Item = Bucket>>(iter: I) -> Self {
        Self {
            buckets: iter.into_iter().collect(),
        }
    }
}

impl Extend<Bucket> for BucketSet {
    fn extend<I: IntoIterator<Item = Bucket>>(&mut self, iter: I) {
        self.buckets.extend(iter);
    }
}

impl IntoIterator for BucketSet {
    type Item = Bucket;
    type IntoIter = smallvec::IntoIter<[Bucket; 16]>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}

impl<'a> IntoIterator for &'a BucketSet {
    type Item = &'a Bucket;
    type IntoIter = std::slice::Iter<'a, Bucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// Sorts buckets by upper bound, in ascending order.
///
/// The sort is stable, so buckets sharing an upper bound keep their relative order. A `NaN` upper bound sorts after
/// `+Inf`.
pub fn sort_buckets(buckets: &mut [Bucket]) {
    buckets.sort_by(|a, b| {
        let oa = OrderedFloat(a.upper_bound);
        let ob = OrderedFloat(b.upper_bound);

        oa.cmp(&ob)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_label_parsing() {
        let bucket = Bucket::from_bound_label("le", "0.25", 3.0).unwrap();
        assert_eq!(bucket, Bucket::new(0.25, 3.0));

        for inf in ["+Inf", "Inf", "inf"] {
            let bucket = Bucket::from_bound_label("le", inf, 10.0).unwrap();
            assert!(bucket.is_terminal(), "'{}' should parse as +Inf", inf);
        }

        let bucket = Bucket::from_bound_label("le", "-Inf", 0.0).unwrap();
        assert!(!bucket.is_terminal());
    }

    #[test]
    fn bound_label_invalid() {
        let err = Bucket::from_bound_label("le", "fast", 1.0).unwrap_err();
        assert!(matches!(err, BucketError::InvalidBucketBound { ref value, .. } if value == "fast"));
        assert_eq!(err.to_string(), "Bucket label 'le' has invalid upper bound 'fast'.");
    }

    #[test]
    fn sort_ascending() {
        let mut set = [(5.0, 8.0), (f64::INFINITY, 10.0), (1.0, 0.0), (2.0, 5.0)]
            .into_iter()
            .map(|(ub, c)| Bucket::new(ub, c))
            .collect::<BucketSet>();
        set.sort();

        let bounds = set.iter().map(|b| b.upper_bound).collect::<Vec<_>>();
        assert_eq!(bounds, vec![1.0, 2.0, 5.0, f64::INFINITY]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut buckets = vec![
            Bucket::new(1.0, 4.0),
            Bucket::new(0.5, 1.0),
            Bucket::new(1.0, 2.0),
            Bucket::new(1.0, 3.0),
        ];
        sort_buckets(&mut buckets);

        let counts = buckets.iter().map(|b| b.count).collect::<Vec<_>>();
        assert_eq!(counts, vec![1.0, 4.0, 2.0, 3.0]);
    }

    #[test]
    fn sort_places_nan_last() {
        let mut buckets = vec![
            Bucket::new(f64::NAN, 1.0),
            Bucket::new(f64::INFINITY, 2.0),
            Bucket::new(-1.0, 0.0),
        ];
        sort_buckets(&mut buckets);

        assert_eq!(buckets[0].upper_bound, -1.0);
        assert!(buckets[1].is_terminal());
        assert!(buckets[2].upper_bound.is_nan());
    }

    #[test]
    fn extend_and_iterate() {
        let mut set = BucketSet::with_capacity(2);
        assert!(set.is_empty());

        set.push(Bucket::new(1.0, 1.0));
        set.extend([Bucket::new(f64::INFINITY, 2.0)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[1].count, 2.0);
        assert_eq!(set.into_iter().count(), 2);
    }
}
