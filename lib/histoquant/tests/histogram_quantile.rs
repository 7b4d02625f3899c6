use histoquant::{quantile, Bucket, BucketSet, ExcludedLabels, HistogramGrouper, LabelSet};

const INF: f64 = f64::INFINITY;

fn bucket_set(raw: &[(f64, f64)]) -> BucketSet {
    raw.iter().map(|&(upper_bound, count)| Bucket::new(upper_bound, count)).collect()
}

#[test]
fn interpolates_inside_target_bucket() {
    let buckets = bucket_set(&[(1.0, 0.0), (2.0, 5.0), (5.0, 8.0), (INF, 10.0)]);
    assert_eq!(buckets.quantile(0.5), 2.0);
}

#[test]
fn rank_beyond_finite_buckets() {
    let buckets = bucket_set(&[(0.0, 0.0), (INF, 10.0)]);
    assert_eq!(buckets.quantile(0.5), 0.0);
}

#[test]
fn full_rank_in_lowest_bucket() {
    let buckets = bucket_set(&[(1.0, 3.0), (INF, 3.0)]);
    assert_eq!(buckets.quantile(1.0), 1.0);
}

#[test]
fn bucket_series_share_fingerprint() {
    let excluded = ExcludedLabels::default();
    let a = LabelSet::from_iter([("__name__", "http_requests"), ("le", "0.5"), ("method", "GET")]);
    let b = LabelSet::from_iter([("__name__", "http_requests"), ("le", "1.0"), ("method", "GET")]);
    let method_only = LabelSet::from_iter([("method", "GET")]);

    assert_eq!(a.fingerprint(&excluded), b.fingerprint(&excluded));
    assert_eq!(a.fingerprint(&excluded), method_only.fingerprint(&excluded));
}

#[test]
fn grouped_series_to_quantiles() {
    let raw = [
        ("api", "0.1", 10.0),
        ("web", "0.1", 1.0),
        ("api", "0.5", 60.0),
        ("web", "+Inf", 2.0),
        ("api", "1", 90.0),
        ("api", "+Inf", 100.0),
        ("web", "0.5", 2.0),
    ];

    let mut grouper = HistogramGrouper::default();
    for (job, le, count) in raw {
        let labels = LabelSet::from_iter([("__name__", "request_duration_seconds_bucket"), ("job", job), ("le", le)]);
        grouper.push(&labels, count);
    }

    let results = grouper.quantiles(0.9).collect::<Vec<_>>();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].0.get("job"), Some("api"));
    assert_eq!(results[0].1, 1.0);

    // rank 1.8 sits in (0.1, 0.5] which holds one observation: 0.1 + 0.4 * 0.8.
    assert_eq!(results[1].0.get("job"), Some("web"));
    assert!((results[1].1 - 0.42).abs() < 1e-12);
}

#[test]
fn slice_sorted_in_place() {
    let mut buckets = vec![Bucket::new(INF, 4.0), Bucket::new(2.0, 4.0), Bucket::new(1.0, 2.0)];
    assert_eq!(quantile(0.5, &mut buckets), 1.0);
    assert_eq!(buckets[0].upper_bound, 1.0);
    assert_eq!(buckets[2].upper_bound, INF);
}
