//! Preview notifier entrypoint.
//!
//! Loads configuration, resolves the base domain from the cluster, and runs
//! the reconciliation loop until interrupted.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::OrthoConfig;
use preview_notifier::{
    Collaborators, GitHubApiSettings, GitHubAppTokenBroker, InMemoryRevisionStore, KubeCluster,
    LinkBuilder, NotifierConfig, NotifierError, OctocrabCommentPublisher, QrSigningClient,
    QrSigningConfig, Reconciler, telemetry,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), NotifierError> {
    let config = load_config()?;
    config.validate()?;
    let mint_token = config.resolve_qr_mint_token()?;
    telemetry::init_tracing(config.log_format()?)?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("TLS crypto provider already installed");
    }

    let timeout = config.http_timeout();
    let cluster = Arc::new(
        KubeCluster::connect(
            config.namespace.clone(),
            config.github_app_secret_name.clone(),
            timeout,
        )
        .await?,
    );
    let domain = cluster
        .base_domain(&config.domain_config_map, &config.domain_config_key)
        .await?;
    let links = LinkBuilder::new(domain);
    let qr_base = config
        .qr_service_url
        .clone()
        .unwrap_or_else(|| links.qr_service_base());
    info!(domain = links.domain(), qr_service = %qr_base, "resolved preview domain");

    let signer = QrSigningClient::new(QrSigningConfig {
        base_url: qr_base,
        mint_token,
        ttl: Duration::from_secs(config.qr_ttl_seconds),
        timeout,
    })?;
    let github = GitHubApiSettings {
        api_base: config.github_api_url.clone(),
        api_version: config.github_api_version.clone(),
        timeout,
    };

    let mut reconciler = Reconciler::new(
        Collaborators {
            lister: cluster.clone(),
            signer: Arc::new(signer),
            tokens: Arc::new(GitHubAppTokenBroker::new(cluster, github.clone())),
            publisher: Arc::new(OctocrabCommentPublisher::new(github)),
            store: Box::new(InMemoryRevisionStore::new()),
        },
        links,
    )?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    info!(
        poll_interval_seconds = config.poll_interval_seconds,
        "starting reconciliation loop"
    );
    reconciler.run(config.poll_interval(), &cancel).await;
    Ok(())
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`NotifierError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<NotifierConfig, NotifierError> {
    NotifierConfig::load().map_err(|error| NotifierError::Configuration {
        message: error.to_string(),
    })
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    let interrupt = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
    cancel.cancel();
}
