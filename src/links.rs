//! Dashboard, log, and deployment-console links for a preview.
//!
//! Every link is derived from the cluster's base domain plus resource
//! identifiers. Construction is pure: the same inputs always yield the same
//! URLs, and dynamic segments are percent-encoded.

use urlencoding::encode;

const LOGS_DASHBOARD_PATH: &str = "/d/tBmi6B0Vz/loki-logs";
const METRICS_DASHBOARD_PATH: &str =
    "/d/a164a7f0339f99e89cea5cb47e9be617/kubernetes-compute-resources-workload";

/// Builds links for previews hosted under one base domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    domain: String,
}

impl LinkBuilder {
    /// Creates a builder for the given base domain.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Borrow the base domain.
    #[must_use]
    pub const fn domain(&self) -> &str {
        self.domain.as_str()
    }

    /// Dashboard view of the workload's logs over the last three hours.
    #[must_use]
    pub fn logs_url(&self, application: &str) -> String {
        format!(
            "{grafana}{LOGS_DASHBOARD_PATH}?orgId=1&var-workload={workload}&from=now-3h&to=now",
            grafana = self.grafana_base(),
            workload = encode(application),
        )
    }

    /// Dashboard view of the workload's compute metrics.
    #[must_use]
    pub fn metrics_url(&self, namespace: &str, application: &str) -> String {
        format!(
            concat!(
                "{grafana}{path}?var-datasource=Prometheus&var-cluster=",
                "&var-namespace={namespace}&var-workload={workload}",
                "&var-type=deployment&orgId=1"
            ),
            grafana = self.grafana_base(),
            path = METRICS_DASHBOARD_PATH,
            namespace = encode(namespace),
            workload = encode(application),
        )
    }

    /// Continuous-delivery console page for the application.
    #[must_use]
    pub fn console_url(&self, application: &str) -> String {
        format!(
            "https://argocd.{domain}/applications/{name}",
            domain = self.domain,
            name = encode(application),
        )
    }

    /// Base URL of the QR signing service.
    #[must_use]
    pub fn qr_service_base(&self) -> String {
        format!("https://qr-code-generator.{}", self.domain)
    }

    fn grafana_base(&self) -> String {
        format!("https://grafana.{}", self.domain)
    }
}
