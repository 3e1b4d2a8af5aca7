//! Polling loop that announces ready previews.
//!
//! Every tick lists the watched resources, runs each through the readiness
//! gate, and publishes a comment for those that pass. Processing is strictly
//! sequential and single-writer, so the revision store needs no locking.
//! Failures for one resource are logged and retried on the next tick; only a
//! cancellation stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cluster::{ListedResource, ResourceLister};
use crate::dedup::RevisionStore;
use crate::error::NotifierError;
use crate::gate::{GateDecision, IgnoreReason, ReadyPreview, WaitReason, evaluate};
use crate::github::{CommentPublisher, InstallationTokenSource, PublishedComment};
use crate::links::LinkBuilder;
use crate::preview::PreviewResource;
use crate::qr::QrSigner;
use crate::render::{CommentFacts, CommentRenderer, PreviewEntry, QrImage};

/// External collaborators used by the [`Reconciler`].
pub struct Collaborators {
    /// Source of preview resources.
    pub lister: Arc<dyn ResourceLister>,
    /// QR link signer.
    pub signer: Arc<dyn QrSigner>,
    /// Installation token source.
    pub tokens: Arc<dyn InstallationTokenSource>,
    /// Comment publisher.
    pub publisher: Arc<dyn CommentPublisher>,
    /// Announced revisions.
    pub store: Box<dyn RevisionStore>,
}

/// Per-outcome counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Comments posted.
    pub notified: usize,
    /// Previews not ready yet.
    pub waiting: usize,
    /// Resources outside the notifier's remit.
    pub ignored: usize,
    /// Previews whose revision was already announced.
    pub already_notified: usize,
    /// Resources that failed to decode.
    pub malformed: usize,
    /// Ready previews whose notification failed.
    pub failed: usize,
}

/// Drives the gate and notification pipeline.
pub struct Reconciler {
    lister: Arc<dyn ResourceLister>,
    signer: Arc<dyn QrSigner>,
    tokens: Arc<dyn InstallationTokenSource>,
    publisher: Arc<dyn CommentPublisher>,
    store: Box<dyn RevisionStore>,
    links: LinkBuilder,
    renderer: CommentRenderer,
}

impl Reconciler {
    /// Creates a reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Render`] when the comment template fails to
    /// compile.
    pub fn new(collaborators: Collaborators, links: LinkBuilder) -> Result<Self, NotifierError> {
        Ok(Self {
            lister: collaborators.lister,
            signer: collaborators.signer,
            tokens: collaborators.tokens,
            publisher: collaborators.publisher,
            store: collaborators.store,
            links,
            renderer: CommentRenderer::new()?,
        })
    }

    /// Polls every `interval` until `cancel` fires.
    ///
    /// The first tick runs immediately. Cancellation abandons an in-flight
    /// tick at its next suspension point.
    pub async fn run(&mut self, interval: Duration, cancel: &CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = self.run_once() => match outcome {
                    Ok(report) => debug!(
                        notified = report.notified,
                        waiting = report.waiting,
                        ignored = report.ignored,
                        already_notified = report.already_notified,
                        malformed = report.malformed,
                        failed = report.failed,
                        "tick complete"
                    ),
                    Err(error) => warn!(error = %error, "tick failed; retrying next interval"),
                },
            }
        }

        info!("reconciliation loop stopped");
    }

    /// Runs one pass over the current listing.
    ///
    /// # Errors
    ///
    /// Returns the lister's error when the resources cannot be listed.
    /// Per-resource failures are logged and counted instead.
    pub async fn run_once(&mut self) -> Result<TickReport, NotifierError> {
        let listed = self.lister.list_previews().await?;
        let mut report = TickReport::default();

        for entry in listed {
            match entry {
                ListedResource::Malformed { name, reason } => {
                    warn!(application = %name, reason = %reason, "skipping undecodable resource");
                    report.malformed += 1;
                }
                ListedResource::Preview(resource) => {
                    self.reconcile_resource(&resource, &mut report).await;
                }
            }
        }

        Ok(report)
    }

    async fn reconcile_resource(&mut self, resource: &PreviewResource, report: &mut TickReport) {
        let application = resource.name.as_str();

        match evaluate(resource, &*self.store) {
            GateDecision::Ignored(reason) => {
                log_ignored(application, reason);
                report.ignored += 1;
            }
            GateDecision::AlreadyNotified { revision } => {
                debug!(application, revision = %revision, "revision already announced");
                report.already_notified += 1;
            }
            GateDecision::Waiting { revision, reason } => {
                log_waiting(application, revision.as_deref(), &reason);
                report.waiting += 1;
            }
            GateDecision::Ready(ready) => match self.notify(&ready).await {
                Ok(comment) => {
                    info!(
                        application,
                        revision = %ready.revision,
                        comment_id = comment.id,
                        comment_url = comment.html_url.as_deref().unwrap_or_default(),
                        "preview announced"
                    );
                    report.notified += 1;
                }
                Err(error) => {
                    warn!(
                        application,
                        revision = %ready.revision,
                        error = %error,
                        "preview notification failed; retrying next tick"
                    );
                    report.failed += 1;
                }
            },
        }
    }

    /// Builds and posts the comment, then records the revision.
    async fn notify(&mut self, ready: &ReadyPreview) -> Result<PublishedComment, NotifierError> {
        let mut previews = Vec::with_capacity(ready.external_urls.len());
        for url in &ready.external_urls {
            let qr = self.signer.sign(url).await.map_or_else(
                |error| {
                    warn!(application = %ready.name, url = %url, error = %error, "QR signing failed");
                    QrImage::Unavailable
                },
                QrImage::Signed,
            );
            previews.push(PreviewEntry {
                url: url.clone(),
                qr,
            });
        }

        let body = self.renderer.render(&CommentFacts {
            revision: ready.revision.clone(),
            console_url: self.links.console_url(&ready.name),
            previews,
            metrics_url: self.links.metrics_url(&ready.namespace, &ready.name),
            logs_url: self.links.logs_url(&ready.name),
        })?;

        let token = self.tokens.installation_token().await?;
        let comment = self.publisher.publish(&ready.review, &token, &body).await?;
        self.store.add(&ready.revision);
        Ok(comment)
    }
}

fn log_ignored(application: &str, reason: IgnoreReason) {
    match reason {
        IgnoreReason::NoOwner => debug!(application, "ignoring resource without owner"),
        IgnoreReason::NotPreview => debug!(application, "ignoring non-preview resource"),
    }
}

fn log_waiting(application: &str, known_revision: Option<&str>, reason: &WaitReason) {
    let revision = known_revision.unwrap_or_default();
    match reason {
        WaitReason::MissingRevision => info!(application, "waiting for build revision annotation"),
        WaitReason::SyncPending => info!(application, revision, "waiting for sync"),
        WaitReason::HealthPending { health } => info!(
            application,
            revision,
            health = health.as_deref().unwrap_or("unknown"),
            "waiting for stable health"
        ),
        WaitReason::NoExternalUrls => info!(application, revision, "waiting for external URLs"),
        WaitReason::MissingReviewMetadata(defect) => warn!(
            application,
            revision,
            defect = %defect,
            "preview lacks usable pull request metadata"
        ),
    }
}
