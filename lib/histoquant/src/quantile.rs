//! Quantile estimation over cumulative histogram buckets.

use tracing::trace;

use crate::bucket::{sort_buckets, Bucket};

/// Estimates the value at quantile `q` from cumulative histogram buckets.
///
/// `buckets` is sorted in place by upper bound, so callers should not rely on its order being preserved. To keep the
/// original order, sort a copy, or hand over an owned [`BucketSet`][crate::BucketSet] via
/// [`BucketSet::quantile`][crate::BucketSet::quantile].
///
/// The value is interpolated assuming a linear distribution of observations within a bucket. If the quantile falls
/// into the highest bucket, the upper bound of the second highest bucket is returned. A natural lower bound of zero is
/// assumed for the lowest bucket when its upper bound is positive; if the lowest bucket has an upper bound less than or
/// equal to zero, that upper bound is returned whenever the quantile falls into it.
///
/// Degenerate inputs are reported through the returned value rather than an error:
///
/// - `q < 0` returns negative infinity
/// - `q > 1` returns positive infinity
/// - fewer than two buckets returns `NaN`
/// - a highest upper bound that is not `+Inf` returns `NaN`
///
/// Counts are not validated. Non-monotonic counts still produce a number, and a bucket with no observations of its own
/// that ends up as the interpolation target yields whatever IEEE-754 division produces.
pub fn quantile(q: f64, buckets: &mut [Bucket]) -> f64 {
    if q < 0.0 {
        return f64::NEG_INFINITY;
    }
    if q > 1.0 {
        return f64::INFINITY;
    }
    if buckets.len() < 2 {
        trace!(buckets = buckets.len(), "Not enough buckets to estimate quantile.");
        return f64::NAN;
    }

    sort_buckets(buckets);

    let last = buckets.len() - 1;
    if !buckets[last].is_terminal() {
        trace!(
            upper_bound = buckets[last].upper_bound,
            "Highest bucket is not +Inf. Unable to estimate quantile."
        );
        return f64::NAN;
    }

    let mut rank = q * buckets[last].count;
    let b = search(last, |i| buckets[i].count >= rank);

    if b == last {
        return buckets[last - 1].upper_bound;
    }
    if b == 0 && buckets[0].upper_bound <= 0.0 {
        return buckets[0].upper_bound;
    }

    let mut bucket_start = 0.0;
    let bucket_end = buckets[b].upper_bound;
    let mut count = buckets[b].count;
    if b > 0 {
        bucket_start = buckets[b - 1].upper_bound;
        count -= buckets[b - 1].count;
        rank -= buckets[b - 1].count;
    }

    bucket_start + (bucket_end - bucket_start) * (rank / count)
}

/// Returns the smallest index in `0..n` for which `f` is true, or `n` if there is none.
///
/// `f` is expected to be false up to some index and true from there on. When it isn't, the result depends on which
/// indices are visited: always the lower midpoint of `lo..hi`, keeping `mid` when `f` holds and moving past it
/// otherwise.
fn search<F>(n: usize, f: F) -> usize
where
    F: Fn(usize) -> bool,
{
    let (mut lo, mut hi) = (0, n);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if f(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}
