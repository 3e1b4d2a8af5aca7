//! Kubernetes-backed implementations of the cluster collaborators.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::debug;

use crate::error::NotifierError;
use crate::github::AppCredential;

use super::application::decode_application;
use super::{CredentialStore, ListedResource, ResourceLister};

/// API group of the watched resource kind.
pub const APPLICATION_GROUP: &str = "argoproj.io";
/// API version of the watched resource kind.
pub const APPLICATION_VERSION: &str = "v1alpha1";
/// Kind of the watched resource.
pub const APPLICATION_KIND: &str = "Application";
/// Plural resource name used in API paths.
pub const APPLICATION_PLURAL: &str = "applications";

/// Live cluster access through `kube`.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    namespace: String,
    secret_name: String,
    timeout: Duration,
}

impl KubeCluster {
    /// Connects using in-cluster configuration, falling back to kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Cluster`] when no usable configuration is
    /// found or the client cannot be built from it.
    pub async fn connect(
        namespace: impl Into<String>,
        secret_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let config = resolve_config().await?;
        let client = Client::try_from(config).map_err(|error| NotifierError::Cluster {
            message: format!("failed to build Kubernetes client: {error}"),
        })?;
        Ok(Self::from_client(client, namespace, secret_name, timeout))
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn from_client(
        client: Client,
        namespace: impl Into<String>,
        secret_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            secret_name: secret_name.into(),
            timeout,
        }
    }

    /// Reads the base domain from a configuration map in the operating
    /// namespace.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Cluster`] when the map cannot be read or the
    /// key is missing or blank, and [`NotifierError::Timeout`] when the API
    /// server does not answer in time.
    pub async fn base_domain(&self, config_map: &str, key: &str) -> Result<String, NotifierError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);
        let map = self
            .bounded("config map lookup", api.get(config_map))
            .await?
            .map_err(|error| NotifierError::Cluster {
                message: format!(
                    "failed to read config map '{}/{config_map}': {error}",
                    self.namespace
                ),
            })?;
        domain_from_config_map(&map, key)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = T> + Send,
    ) -> Result<T, NotifierError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| NotifierError::Timeout {
                operation: operation.to_owned(),
            })
    }
}

/// Resolves client configuration: the pod's service account first, then the
/// local kubeconfig.
///
/// # Errors
///
/// Returns [`NotifierError::Cluster`] when neither source yields a
/// configuration.
pub async fn resolve_config() -> Result<Config, NotifierError> {
    match Config::incluster() {
        Ok(config) => Ok(config),
        Err(in_cluster) => {
            debug!(error = %in_cluster, "in-cluster configuration unavailable, reading kubeconfig");
            Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .map_err(|error| NotifierError::Cluster {
                    message: format!(
                        "no Kubernetes configuration found (in-cluster: {in_cluster}; kubeconfig: {error})"
                    ),
                })
        }
    }
}

/// Extracts the trimmed, non-empty domain stored under `key`.
///
/// # Errors
///
/// Returns [`NotifierError::Cluster`] when the key is missing or blank.
pub fn domain_from_config_map(map: &ConfigMap, key: &str) -> Result<String, NotifierError> {
    let domain = map
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.trim())
        .unwrap_or_default();

    if domain.is_empty() {
        return Err(NotifierError::Cluster {
            message: format!("config map key '{key}' is missing or empty"),
        });
    }
    Ok(domain.to_owned())
}

/// Builds an [`AppCredential`] from the data of a secret.
///
/// # Errors
///
/// Returns [`NotifierError::Credential`] when the secret has no data or a
/// required key is missing or blank.
pub fn credential_from_secret(secret: &Secret) -> Result<AppCredential, NotifierError> {
    let data: BTreeMap<String, Vec<u8>> = secret
        .data
        .as_ref()
        .map(|entries| {
            entries
                .iter()
                .map(|(key, value)| (key.clone(), value.0.clone()))
                .collect()
        })
        .unwrap_or_default();
    AppCredential::from_secret_data(&data)
}

#[async_trait]
impl ResourceLister for KubeCluster {
    async fn list_previews(&self) -> Result<Vec<ListedResource>, NotifierError> {
        let gvk = GroupVersionKind::gvk(APPLICATION_GROUP, APPLICATION_VERSION, APPLICATION_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, APPLICATION_PLURAL);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let list = self
            .bounded("application listing", api.list(&ListParams::default()))
            .await?
            .map_err(|error| NotifierError::Cluster {
                message: format!("failed to list {APPLICATION_PLURAL}: {error}"),
            })?;

        Ok(list.items.into_iter().map(decode_application).collect())
    }
}

#[async_trait]
impl CredentialStore for KubeCluster {
    async fn app_credential(&self) -> Result<AppCredential, NotifierError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);
        let secret = self
            .bounded("secret lookup", api.get(&self.secret_name))
            .await?
            .map_err(|error| NotifierError::Credential {
                message: format!(
                    "failed to read secret '{}/{}': {error}",
                    self.namespace, self.secret_name
                ),
            })?;
        credential_from_secret(&secret)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::ByteString;
    use rstest::rstest;

    use super::*;
    use crate::github::credential::{APP_ID_KEY, INSTALLATION_ID_KEY, PRIVATE_KEY_KEY};

    fn config_map(entries: &[(&str, &str)]) -> ConfigMap {
        ConfigMap {
            data: Some(
                entries
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                    .collect(),
            ),
            ..ConfigMap::default()
        }
    }

    #[rstest]
    #[case::plain("example.dev", "example.dev")]
    #[case::padded("  example.dev\n", "example.dev")]
    fn reads_trimmed_domain(#[case] stored: &str, #[case] expected: &str) {
        let map = config_map(&[("captain_domain", stored)]);

        let domain = domain_from_config_map(&map, "captain_domain").expect("domain should be read");

        assert_eq!(domain, expected);
    }

    #[rstest]
    #[case::missing_key(config_map(&[("other", "example.dev")]))]
    #[case::blank_value(config_map(&[("captain_domain", "   ")]))]
    #[case::no_data(ConfigMap::default())]
    fn rejects_missing_domain(#[case] map: ConfigMap) {
        let result = domain_from_config_map(&map, "captain_domain");

        assert!(
            matches!(result, Err(NotifierError::Cluster { .. })),
            "expected Cluster error, got {result:?}"
        );
    }

    #[rstest]
    fn builds_credential_from_secret_bytes() {
        let secret = Secret {
            data: Some(BTreeMap::from([
                (APP_ID_KEY.to_owned(), ByteString(b"4242\n".to_vec())),
                (INSTALLATION_ID_KEY.to_owned(), ByteString(b"99".to_vec())),
                (PRIVATE_KEY_KEY.to_owned(), ByteString(b"-----BEGIN KEY-----".to_vec())),
            ])),
            ..Secret::default()
        };

        let credential = credential_from_secret(&secret).expect("credential should decode");

        assert_eq!(credential.app_id(), "4242");
        assert_eq!(credential.installation_id(), "99");
    }

    const KUBECONFIG: &str = "\
apiVersion: v1
kind: Config
current-context: local
clusters:
- name: local
  cluster:
    server: https://127.0.0.1:6443
contexts:
- name: local
  context:
    cluster: local
    user: local
users:
- name: local
  user:
    token: local-token
";

    #[rstest]
    #[tokio::test]
    async fn falls_back_to_kubeconfig_outside_a_cluster() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
        let kubeconfig = temp_dir.path().join("config");
        std::fs::write(&kubeconfig, KUBECONFIG).expect("kubeconfig should be written");
        let kubeconfig_path = kubeconfig.to_string_lossy().to_string();

        let _guard = env_lock::lock_env([
            ("KUBERNETES_SERVICE_HOST", None),
            ("KUBERNETES_SERVICE_PORT", None),
            ("KUBECONFIG", Some(kubeconfig_path.as_str())),
        ]);

        let config = resolve_config().await.expect("kubeconfig should resolve");

        assert!(
            config.cluster_url.to_string().starts_with("https://127.0.0.1:6443"),
            "unexpected cluster url {}",
            config.cluster_url
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_configuration_is_a_cluster_error() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
        let missing = temp_dir.path().join("absent").to_string_lossy().to_string();

        let _guard = env_lock::lock_env([
            ("KUBERNETES_SERVICE_HOST", None),
            ("KUBERNETES_SERVICE_PORT", None),
            ("KUBECONFIG", Some(missing.as_str())),
        ]);

        let result = resolve_config().await;

        assert!(
            matches!(result, Err(NotifierError::Cluster { .. })),
            "expected Cluster error, got {:?}",
            result.map(|config| config.cluster_url)
        );
    }

    #[rstest]
    fn empty_secret_is_a_credential_error() {
        let result = credential_from_secret(&Secret::default());

        assert!(
            matches!(result, Err(NotifierError::Credential { .. })),
            "expected Credential error, got {result:?}"
        );
    }
}
