//! Label sets and reserved label names.

use std::{borrow::Borrow, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::fingerprint::{fingerprint, Fingerprint};

/// Label holding the metric name of a series.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Label holding the upper bound of a histogram bucket series.
pub const BUCKET_LABEL: &str = "le";

/// The set of labels that identifies a series.
///
/// Labels are kept ordered by name, which makes iteration, equality, and display independent of insertion order.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Creates an empty `LabelSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a label, returning the previous value if the name was already present.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Option<String>
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.0.insert(name.into(), value.into())
    }

    /// Gets the value of the given label.
    pub fn get<N>(&self, name: &N) -> Option<&str>
    where
        String: Borrow<N>,
        N: Ord + ?Sized,
    {
        self.0.get(name).map(String::as_str)
    }

    /// Removes a label, returning its value if it was present.
    pub fn remove<N>(&mut self, name: &N) -> Option<String>
    where
        String: Borrow<N>,
        N: Ord + ?Sized,
    {
        self.0.remove(name)
    }

    /// Returns the number of labels in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the labels, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns a copy of this set with every excluded label removed.
    pub fn without(&self, excluded: &ExcludedLabels) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(name, _)| !excluded.contains(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    /// Computes the fingerprint of this set, ignoring the excluded labels.
    pub fn fingerprint(&self, excluded: &ExcludedLabels) -> Fingerprint {
        fingerprint(self, excluded)
    }
}

impl<N, V> FromIterator<(N, V)> for LabelSet
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;

        let mut needs_separator = false;
        for (name, value) in &self.0 {
            if needs_separator {
                write!(f, ", ")?;
            } else {
                needs_separator = true;
            }

            write!(f, "{}={:?}", name, value)?;
        }

        write!(f, "}}")
    }
}

/// An error encountered while building an exclusion set.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ExcludedLabelsError {
    /// No label names were given.
    #[snafu(display("At least one label must be excluded from histogram fingerprints."))]
    NoExcludedLabels,
}

/// Label names that are ignored when fingerprinting a series.
///
/// By default, this is the metric name label and the bucket label, so that every bucket series of a histogram maps to
/// the same fingerprint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExcludedLabels {
    names: Vec<String>,
}

impl ExcludedLabels {
    /// Creates a new `ExcludedLabels` from the given label names.
    ///
    /// Duplicate names are collapsed.
    ///
    /// ## Errors
    ///
    /// If no label names are given, an error is returned.
    pub fn new<I, T>(names: I) -> Result<Self, ExcludedLabelsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut names = names.into_iter().map(Into::into).collect::<Vec<_>>();
        if names.is_empty() {
            return Err(ExcludedLabelsError::NoExcludedLabels);
        }

        names.sort_unstable();
        names.dedup();

        Ok(Self { names })
    }

    /// Returns `true` if the given label name is excluded.
    pub fn contains(&self, name: &str) -> bool {
        // There are only ever a handful of excluded names, so a linear scan beats hashing.
        self.names.iter().any(|excluded| excluded == name)
    }

    /// Returns an iterator over the excluded label names, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ExcludedLabels {
    fn default() -> Self {
        Self {
            names: vec![METRIC_NAME_LABEL.to_string(), BUCKET_LABEL.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_sorted() {
        let labels = LabelSet::from_iter([("job", "api"), ("__name__", "rpc_seconds_bucket"), ("le", "0.5")]);
        assert_eq!(
            labels.to_string(),
            r#"{__name__="rpc_seconds_bucket", job="api", le="0.5"}"#
        );
        assert_eq!(LabelSet::new().to_string(), "{}");
    }

    #[test]
    fn insert_get_remove() {
        let mut labels = LabelSet::new();
        assert_eq!(labels.insert("job", "api"), None);
        assert_eq!(labels.insert("job", "web"), Some("api".to_string()));
        assert_eq!(labels.get("job"), Some("web"));
        assert_eq!(labels.len(), 1);

        assert_eq!(labels.remove("job"), Some("web".to_string()));
        assert!(labels.is_empty());
    }

    #[test]
    fn without_excluded() {
        let labels = LabelSet::from_iter([("__name__", "rpc_seconds_bucket"), ("le", "0.5"), ("job", "api")]);
        let stripped = labels.without(&ExcludedLabels::default());

        assert_eq!(stripped, LabelSet::from_iter([("job", "api")]));
    }

    #[test]
    fn excluded_labels_default() {
        let excluded = ExcludedLabels::default();
        assert!(excluded.contains(METRIC_NAME_LABEL));
        assert!(excluded.contains(BUCKET_LABEL));
        assert!(!excluded.contains("job"));
    }

    #[test]
    fn excluded_labels_custom() {
        let excluded = ExcludedLabels::new(["le", "__name__", "le", "replica"]).unwrap();
        assert_eq!(excluded.iter().collect::<Vec<_>>(), vec!["__name__", "le", "replica"]);

        let empty: [&str; 0] = [];
        assert!(matches!(
            ExcludedLabels::new(empty),
            Err(ExcludedLabelsError::NoExcludedLabels)
        ));
    }

    #[test]
    fn serde_transparent() {
        let labels: LabelSet = serde_json::from_str(r#"{"job":"api","instance":"a:80"}"#).unwrap();
        assert_eq!(labels.get("instance"), Some("a:80"));
        assert_eq!(serde_json::to_string(&labels).unwrap(), r#"{"instance":"a:80","job":"api"}"#);
    }
}
