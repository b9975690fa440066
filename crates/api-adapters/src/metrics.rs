//! Prometheus registry for the cover pipeline. Doubles as the pipeline's
//! `PipelineReporter`.

use domains::{CleanupTarget, PipelineReporter};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct TargetLabels {
    target: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct OutcomeLabels {
    outcome: String,
}

pub struct Metrics {
    registry: Registry,
    cleanup_failures: Family<TargetLabels, Counter>,
    covers_processed: Family<OutcomeLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let cleanup_failures = Family::<TargetLabels, Counter>::default();
        let covers_processed = Family::<OutcomeLabels, Counter>::default();

        // Counters get their `_total` suffix at encode time.
        registry.register(
            "cleanup_failures",
            "Temp uploads or cover assets that could not be deleted",
            cleanup_failures.clone(),
        );
        registry.register(
            "covers_processed",
            "Cover uploads by pipeline outcome",
            covers_processed.clone(),
        );

        Self {
            registry,
            cleanup_failures,
            covers_processed,
        }
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

impl PipelineReporter for Metrics {
    fn cleanup_failed(&self, target: CleanupTarget, _location: &str, _error: &str) {
        self.cleanup_failures
            .get_or_create(&TargetLabels {
                target: target.as_str().to_string(),
            })
            .inc();
    }

    fn cover_processed(&self, outcome: &str) {
        self.covers_processed
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_labelled() {
        let metrics = Metrics::new();
        metrics.cleanup_failed(CleanupTarget::Temp, "/tmp/x", "denied");
        metrics.cleanup_failed(CleanupTarget::Temp, "/tmp/y", "denied");
        metrics.cover_processed("invalid size");

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"cleanup_failures_total{target="temp"} 2"#));
        assert!(text.contains(r#"covers_processed_total{outcome="invalid size"} 1"#));
        assert!(text.trim_end().ends_with("# EOF"));
    }
}
