//! Prometheus export for the `metrics` facade.
//!
//! The recorder is process-global; [`init_metrics`] installs it once at
//! startup and [`get_metrics`] renders the text exposition for `/metrics`.

use anyhow::{Context, anyhow};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Fails if a recorder is already installed.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow!("metrics recorder already initialized"))
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_render_is_a_comment() {
        if METRICS_HANDLE.get().is_none() {
            assert!(get_metrics().starts_with('#'));
        }
    }
}
