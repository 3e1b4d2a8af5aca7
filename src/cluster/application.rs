//! Decoding of Argo CD `Application` objects into [`PreviewResource`].

use kube::api::DynamicObject;
use serde::Deserialize;

use crate::preview::{PreviewResource, PreviewStatus};

use super::ListedResource;

const UNNAMED: &str = "<unnamed>";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplicationBody {
    spec: ApplicationSpec,
    status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplicationSpec {
    destination: Destination,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Destination {
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplicationStatus {
    sync: SyncStatus,
    health: HealthStatus,
    summary: Summary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyncStatus {
    revision: Option<String>,
    revisions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HealthStatus {
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Summary {
    #[serde(rename = "externalURLs")]
    external_urls: Vec<String>,
}

/// Decodes one listed object.
///
/// Missing optional fields decode to empty values; a body whose fields have
/// the wrong shape is reported as [`ListedResource::Malformed`].
#[must_use]
pub fn decode_application(object: DynamicObject) -> ListedResource {
    let name = object
        .metadata
        .name
        .clone()
        .unwrap_or_else(|| UNNAMED.to_owned());

    let body: ApplicationBody = match serde_json::from_value(object.data) {
        Ok(body) => body,
        Err(error) => {
            return ListedResource::Malformed {
                name,
                reason: error.to_string(),
            };
        }
    };

    let owners = object
        .metadata
        .owner_references
        .unwrap_or_default()
        .into_iter()
        .map(|owner| owner.name)
        .collect();

    let sync = body.status.sync;
    let synced_revisions = sync.revision.into_iter().chain(sync.revisions).collect();

    let external_urls = body
        .status
        .summary
        .external_urls
        .into_iter()
        .filter(|url| !url.trim().is_empty())
        .collect();

    ListedResource::Preview(PreviewResource {
        name,
        owners,
        annotations: object.metadata.annotations.unwrap_or_default(),
        status: PreviewStatus {
            synced_revisions,
            health: body.status.health.status,
            external_urls,
            destination_namespace: body.spec.destination.namespace.unwrap_or_default(),
        },
    })
}
