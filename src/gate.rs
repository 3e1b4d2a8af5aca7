//! Readiness gate deciding whether a preview is ready to announce.
//!
//! The gate is an ordered chain of predicates evaluated fresh every tick.
//! The first failing predicate decides the outcome and nothing after it is
//! consulted, so a resource that is, for example, still syncing never has
//! its review metadata inspected. The chain is:
//!
//! 1. the resource has an owning controller
//! 2. it is annotated as a preview environment
//! 3. it carries a build revision
//! 4. the revision has not been announced yet
//! 5. the controller has synced that revision
//! 6. health is `Healthy` or `Degraded`
//! 7. at least one external URL is published
//! 8. the review annotations name a valid pull request

use crate::dedup::RevisionStore;
use crate::github::{ReviewMetadataError, ReviewTarget};
use crate::preview::{
    HEAD_SHA_ANNOTATION, PREVIEW_ENVIRONMENT_ANNOTATION, PULL_REQUEST_NUMBER_ANNOTATION,
    PreviewResource, REPOSITORY_NAME_ANNOTATION, REPOSITORY_ORGANIZATION_ANNOTATION,
};

/// Health classifications considered stable enough to announce.
pub const ACTIONABLE_HEALTH: [&str; 2] = ["Healthy", "Degraded"];

/// Why a resource is permanently outside the notifier's remit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No controller owns the resource.
    NoOwner,
    /// The preview environment annotation is not `true`.
    NotPreview,
}

/// Why a preview is not ready yet; it is re-evaluated next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReason {
    /// The build revision annotation is missing or empty.
    MissingRevision,
    /// The controller has not synced the revision yet.
    SyncPending,
    /// Health is not actionable yet.
    HealthPending {
        /// Reported health, if any.
        health: Option<String>,
    },
    /// No external URL has been published.
    NoExternalUrls,
    /// The review annotations are missing or malformed.
    MissingReviewMetadata(ReviewMetadataError),
}

/// A preview that passed every predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyPreview {
    /// Resource name.
    pub name: String,
    /// Revision to announce.
    pub revision: String,
    /// Namespace the preview deploys into.
    pub namespace: String,
    /// Externally reachable URLs.
    pub external_urls: Vec<String>,
    /// Pull request receiving the notification.
    pub review: ReviewTarget,
}

/// Outcome of evaluating one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Not a preview resource.
    Ignored(IgnoreReason),
    /// Already announced for this revision.
    AlreadyNotified {
        /// The announced revision.
        revision: String,
    },
    /// Not ready yet.
    Waiting {
        /// Revision under evaluation, when known.
        revision: Option<String>,
        /// The failing predicate.
        reason: WaitReason,
    },
    /// Ready to announce.
    Ready(ReadyPreview),
}

/// Evaluates the predicate chain for `resource`.
#[must_use]
pub fn evaluate(resource: &PreviewResource, store: &dyn RevisionStore) -> GateDecision {
    if !resource.has_owner() {
        return GateDecision::Ignored(IgnoreReason::NoOwner);
    }
    if resource.annotation(PREVIEW_ENVIRONMENT_ANNOTATION) != Some("true") {
        return GateDecision::Ignored(IgnoreReason::NotPreview);
    }

    let Some(revision) = resource.annotation(HEAD_SHA_ANNOTATION) else {
        return waiting(None, WaitReason::MissingRevision);
    };
    if store.contains(revision) {
        return GateDecision::AlreadyNotified {
            revision: revision.to_owned(),
        };
    }

    let status = &resource.status;
    if !status.synced_revisions.iter().any(|synced| synced == revision) {
        return waiting(Some(revision), WaitReason::SyncPending);
    }
    let healthy = status
        .health
        .as_deref()
        .is_some_and(|health| ACTIONABLE_HEALTH.contains(&health));
    if !healthy {
        return waiting(
            Some(revision),
            WaitReason::HealthPending {
                health: status.health.clone(),
            },
        );
    }
    if status.external_urls.is_empty() {
        return waiting(Some(revision), WaitReason::NoExternalUrls);
    }

    match ReviewTarget::new(
        resource.annotation(REPOSITORY_ORGANIZATION_ANNOTATION),
        resource.annotation(REPOSITORY_NAME_ANNOTATION),
        resource.annotation(PULL_REQUEST_NUMBER_ANNOTATION),
    ) {
        Ok(review) => GateDecision::Ready(ReadyPreview {
            name: resource.name.clone(),
            revision: revision.to_owned(),
            namespace: status.destination_namespace.clone(),
            external_urls: status.external_urls.clone(),
            review,
        }),
        Err(defect) => waiting(Some(revision), WaitReason::MissingReviewMetadata(defect)),
    }
}

fn waiting(revision: Option<&str>, reason: WaitReason) -> GateDecision {
    GateDecision::Waiting {
        revision: revision.map(ToOwned::to_owned),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::dedup::{InMemoryRevisionStore, MockRevisionStore};
    use crate::preview::PreviewStatus;

    #[fixture]
    fn ready_resource() -> PreviewResource {
        PreviewResource {
            name: "web-pr-7".to_owned(),
            owners: vec!["previews".to_owned()],
            annotations: BTreeMap::from([
                (PREVIEW_ENVIRONMENT_ANNOTATION.to_owned(), "true".to_owned()),
                (HEAD_SHA_ANNOTATION.to_owned(), "abc123".to_owned()),
                (REPOSITORY_ORGANIZATION_ANNOTATION.to_owned(), "acme".to_owned()),
                (REPOSITORY_NAME_ANNOTATION.to_owned(), "web".to_owned()),
                (PULL_REQUEST_NUMBER_ANNOTATION.to_owned(), "7".to_owned()),
            ]),
            status: PreviewStatus {
                synced_revisions: vec!["abc123".to_owned()],
                health: Some("Healthy".to_owned()),
                external_urls: vec!["https://preview.example.com".to_owned()],
                destination_namespace: "web-pr-7".to_owned(),
            },
        }
    }

    fn with_annotation(mut resource: PreviewResource, key: &str, value: &str) -> PreviewResource {
        resource.annotations.insert(key.to_owned(), value.to_owned());
        resource
    }

    #[rstest]
    fn fully_ready_resource_passes(ready_resource: PreviewResource) {
        let decision = evaluate(&ready_resource, &InMemoryRevisionStore::new());

        let ready = match decision {
            GateDecision::Ready(ready) => ready,
            other => panic!("expected Ready, got {other:?}"),
        };
        assert_eq!(ready.name, "web-pr-7");
        assert_eq!(ready.revision, "abc123");
        assert_eq!(ready.namespace, "web-pr-7");
        assert_eq!(ready.review.comments_path(), "/repos/acme/web/issues/7/comments");
    }

    #[rstest]
    #[case::healthy("Healthy")]
    #[case::degraded("Degraded")]
    fn stable_health_values_are_actionable(mut ready_resource: PreviewResource, #[case] health: &str) {
        ready_resource.status.health = Some(health.to_owned());

        assert!(matches!(
            evaluate(&ready_resource, &InMemoryRevisionStore::new()),
            GateDecision::Ready(_)
        ));
    }

    #[rstest]
    fn ownerless_resource_is_ignored_before_store_lookup(mut ready_resource: PreviewResource) {
        ready_resource.owners.clear();
        let mut store = MockRevisionStore::new();
        store.expect_contains().never();

        assert_eq!(
            evaluate(&ready_resource, &store),
            GateDecision::Ignored(IgnoreReason::NoOwner)
        );
    }

    #[rstest]
    #[case::absent(None)]
    #[case::false_value(Some("false"))]
    #[case::capitalised(Some("True"))]
    fn non_preview_resource_is_ignored(
        mut ready_resource: PreviewResource,
        #[case] marker: Option<&str>,
    ) {
        ready_resource.annotations.remove(PREVIEW_ENVIRONMENT_ANNOTATION);
        if let Some(value) = marker {
            ready_resource = with_annotation(ready_resource, PREVIEW_ENVIRONMENT_ANNOTATION, value);
        }
        let mut store = MockRevisionStore::new();
        store.expect_contains().never();

        assert_eq!(
            evaluate(&ready_resource, &store),
            GateDecision::Ignored(IgnoreReason::NotPreview)
        );
    }

    #[rstest]
    fn empty_revision_waits(ready_resource: PreviewResource) {
        let resource = with_annotation(ready_resource, HEAD_SHA_ANNOTATION, "");
        let mut store = MockRevisionStore::new();
        store.expect_contains().never();

        assert_eq!(
            evaluate(&resource, &store),
            GateDecision::Waiting {
                revision: None,
                reason: WaitReason::MissingRevision,
            }
        );
    }

    #[rstest]
    fn announced_revision_short_circuits_remaining_checks(mut ready_resource: PreviewResource) {
        ready_resource.status.health = Some("Progressing".to_owned());
        let mut store = MockRevisionStore::new();
        store
            .expect_contains()
            .withf(|revision| revision == "abc123")
            .times(1)
            .return_const(true);

        assert_eq!(
            evaluate(&ready_resource, &store),
            GateDecision::AlreadyNotified {
                revision: "abc123".to_owned(),
            }
        );
    }

    #[rstest]
    fn unsynced_revision_waits_before_health_check(mut ready_resource: PreviewResource) {
        ready_resource.status.synced_revisions = vec!["old456".to_owned()];
        ready_resource.status.health = None;

        assert_eq!(
            evaluate(&ready_resource, &InMemoryRevisionStore::new()),
            GateDecision::Waiting {
                revision: Some("abc123".to_owned()),
                reason: WaitReason::SyncPending,
            }
        );
    }

    #[rstest]
    #[case::progressing(Some("Progressing"))]
    #[case::unknown(Some("Unknown"))]
    #[case::missing(None)]
    fn unstable_health_waits(mut ready_resource: PreviewResource, #[case] health: Option<&str>) {
        ready_resource.status.health = health.map(ToOwned::to_owned);
        ready_resource.status.external_urls.clear();

        assert_eq!(
            evaluate(&ready_resource, &InMemoryRevisionStore::new()),
            GateDecision::Waiting {
                revision: Some("abc123".to_owned()),
                reason: WaitReason::HealthPending {
                    health: health.map(ToOwned::to_owned),
                },
            }
        );
    }

    #[rstest]
    fn missing_urls_wait_before_metadata_check(mut ready_resource: PreviewResource) {
        ready_resource.status.external_urls.clear();
        ready_resource.annotations.remove(PULL_REQUEST_NUMBER_ANNOTATION);

        assert_eq!(
            evaluate(&ready_resource, &InMemoryRevisionStore::new()),
            GateDecision::Waiting {
                revision: Some("abc123".to_owned()),
                reason: WaitReason::NoExternalUrls,
            }
        );
    }

    #[rstest]
    #[case::no_owner(REPOSITORY_ORGANIZATION_ANNOTATION, "", ReviewMetadataError::MissingOwner)]
    #[case::no_repository(REPOSITORY_NAME_ANNOTATION, "", ReviewMetadataError::MissingRepository)]
    #[case::no_number(
        PULL_REQUEST_NUMBER_ANNOTATION,
        "",
        ReviewMetadataError::MissingPullRequestNumber
    )]
    #[case::non_numeric(
        PULL_REQUEST_NUMBER_ANNOTATION,
        "seven",
        ReviewMetadataError::InvalidPullRequestNumber("seven".to_owned())
    )]
    fn review_metadata_defects_wait(
        ready_resource: PreviewResource,
        #[case] key: &str,
        #[case] value: &str,
        #[case] defect: ReviewMetadataError,
    ) {
        let resource = with_annotation(ready_resource, key, value);

        assert_eq!(
            evaluate(&resource, &InMemoryRevisionStore::new()),
            GateDecision::Waiting {
                revision: Some("abc123".to_owned()),
                reason: WaitReason::MissingReviewMetadata(defect),
            }
        );
    }
}
