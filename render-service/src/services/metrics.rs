//! Prometheus metrics for render-service.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Registry and the collectors registered on it, set together exactly once.
struct RenderMetrics {
    registry: Registry,
    render_requests: IntCounterVec,
    provider_latency: HistogramVec,
    provider_errors: IntCounterVec,
}

static METRICS: OnceLock<RenderMetrics> = OnceLock::new();

impl RenderMetrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let render_requests = IntCounterVec::new(
            Opts::new("render_requests_total", "Render requests by outcome"),
            &["outcome"],
        )?;

        let provider_latency = HistogramVec::new(
            HistogramOpts::new(
                "render_provider_latency_seconds",
                "Image provider API latency in seconds",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
            &["model"],
        )?;

        let provider_errors = IntCounterVec::new(
            Opts::new("render_provider_errors_total", "Image provider errors"),
            &["error_type"],
        )?;

        registry.register(Box::new(render_requests.clone()))?;
        registry.register(Box::new(provider_latency.clone()))?;
        registry.register(Box::new(provider_errors.clone()))?;

        Ok(Self {
            registry,
            render_requests,
            provider_latency,
            provider_errors,
        })
    }
}

/// Register all metrics. Later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    // A concurrent caller may win the race; its set is kept whole and ours dropped.
    if METRICS.set(RenderMetrics::new()?).is_ok() {
        tracing::info!("Prometheus metrics initialized");
    }
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(metrics) => &metrics.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}

/// Count a finished render request.
pub fn record_render_request(outcome: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics.render_requests.with_label_values(&[outcome]).inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(model: &str, duration_secs: f64) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .provider_latency
            .with_label_values(&[model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(error_type: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics.provider_errors.with_label_values(&[error_type]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_init_exports_the_counters_it_records_into() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| init_metrics().is_ok()))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        record_render_request("concurrent_init_check");
        record_provider_error("concurrent_init_check");

        let text = get_metrics();
        assert!(text.contains(r#"render_requests_total{outcome="concurrent_init_check"} 1"#));
        assert!(text.contains(r#"render_provider_errors_total{error_type="concurrent_init_check"} 1"#));
    }
}
