//! Histogram quantile configuration.

use histoquant_config::{ConfigurationError, GenericConfiguration};
use serde::Deserialize;
use snafu::{ResultExt as _, Snafu};

use crate::{
    group::HistogramGrouper,
    labels::{ExcludedLabels, ExcludedLabelsError, BUCKET_LABEL, METRIC_NAME_LABEL},
};

/// An error encountered while loading histogram quantile configuration.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum HistogramConfigurationError {
    /// The configuration could not be read.
    #[snafu(display("Failed to load histogram quantile configuration."))]
    Load {
        /// Error source.
        source: ConfigurationError,
    },

    /// The configured label names do not form a valid exclusion set.
    #[snafu(display("Invalid histogram label configuration."))]
    Labels {
        /// Error source.
        source: ExcludedLabelsError,
    },
}

/// Histogram quantile configuration.
///
/// Controls which labels identify the metric name and bucket boundary of a series, and thus which labels are ignored
/// when grouping bucket series into histograms.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HistogramQuantileConfiguration {
    /// Label holding the metric name.
    ///
    /// Defaults to `__name__`.
    #[serde(default = "default_metric_name_label", rename = "histogram_metric_name_label")]
    metric_name_label: String,

    /// Label holding the bucket upper bound.
    ///
    /// Defaults to `le`.
    #[serde(default = "default_bucket_label", rename = "histogram_bucket_label")]
    bucket_label: String,

    /// Additional labels to ignore when grouping buckets.
    ///
    /// Defaults to none.
    #[serde(default, rename = "histogram_additional_excluded_labels")]
    additional_excluded_labels: Vec<String>,
}

fn default_metric_name_label() -> String {
    METRIC_NAME_LABEL.to_string()
}

fn default_bucket_label() -> String {
    BUCKET_LABEL.to_string()
}

impl HistogramQuantileConfiguration {
    /// Creates a new `HistogramQuantileConfiguration` from the given configuration.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, HistogramConfigurationError> {
        config.as_typed().context(Load)
    }

    /// Returns the label holding the bucket upper bound.
    pub fn bucket_label(&self) -> &str {
        &self.bucket_label
    }

    /// Builds the set of labels excluded from histogram fingerprints.
    ///
    /// ## Errors
    ///
    /// If every configured label name is empty, an error is returned.
    pub fn excluded_labels(&self) -> Result<ExcludedLabels, HistogramConfigurationError> {
        let names = [&self.metric_name_label, &self.bucket_label]
            .into_iter()
            .chain(&self.additional_excluded_labels)
            .filter(|name| !name.is_empty())
            .cloned();

        ExcludedLabels::new(names).context(Labels)
    }

    /// Builds a [`HistogramGrouper`] using the configured labels.
    ///
    /// ## Errors
    ///
    /// If every configured label name is empty, an error is returned.
    pub fn build_grouper(&self) -> Result<HistogramGrouper, HistogramConfigurationError> {
        Ok(HistogramGrouper::new(self.bucket_label.clone(), self.excluded_labels()?))
    }
}

impl Default for HistogramQuantileConfiguration {
    fn default() -> Self {
        Self {
            metric_name_label: default_metric_name_label(),
            bucket_label: default_bucket_label(),
            additional_excluded_labels: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use histoquant_config::ConfigurationLoader;
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let config = ConfigurationLoader::default().with_defaults(json!({})).into_generic();
        let typed = HistogramQuantileConfiguration::from_configuration(&config).unwrap();

        assert_eq!(typed, HistogramQuantileConfiguration::default());
        assert_eq!(typed.bucket_label(), "le");
        assert_eq!(typed.excluded_labels().unwrap(), ExcludedLabels::default());
    }

    #[test]
    fn custom_labels() {
        let config = ConfigurationLoader::default()
            .with_defaults(json!({
                "histogram_bucket_label": "upper",
                "histogram_additional_excluded_labels": ["replica", "le"],
            }))
            .into_generic();
        let typed = HistogramQuantileConfiguration::from_configuration(&config).unwrap();

        let excluded = typed.excluded_labels().unwrap();
        assert_eq!(excluded.iter().collect::<Vec<_>>(), vec!["__name__", "le", "replica", "upper"]);

        let grouper = typed.build_grouper().unwrap();
        assert!(grouper.is_empty());
    }

    #[test]
    fn all_labels_empty() {
        let config = ConfigurationLoader::default()
            .with_defaults(json!({
                "histogram_metric_name_label": "",
                "histogram_bucket_label": "",
            }))
            .into_generic();
        let typed = HistogramQuantileConfiguration::from_configuration(&config).unwrap();

        assert!(matches!(
            typed.excluded_labels(),
            Err(HistogramConfigurationError::Labels { .. })
        ));
    }

    #[test]
    fn invalid_type() {
        let config = ConfigurationLoader::default()
            .with_defaults(json!({ "histogram_additional_excluded_labels": 5 }))
            .into_generic();

        assert!(matches!(
            HistogramQuantileConfiguration::from_configuration(&config),
            Err(HistogramConfigurationError::Load {
                source: ConfigurationError::InvalidFieldType { .. }
            })
        ));
    }
}
