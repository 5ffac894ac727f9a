use std::{process, sync::Arc, time::Duration};

use portico::{
    application::{content::ContentService, error::AppError},
    cache::{CacheConfig, CacheStore},
    config,
    infra::{
        directus::DirectusSource,
        error::InfraError,
        http::{GatewayState, build_router},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    if settings.admin.revalidate_token.is_none() {
        warn!(
            target = "portico::startup",
            "admin.revalidate_token is not set; /api/revalidate will reject every request"
        );
    }
    if settings.admin.webhook_secret.is_none() {
        warn!(
            target = "portico::startup",
            "admin.webhook_secret is not set; /api/webhooks/directus will reject every request"
        );
    }

    let source = Arc::new(DirectusSource::new(&settings.upstream).map_err(AppError::from)?);
    let store = Arc::new(CacheStore::new());
    let cache_config = CacheConfig::from(&settings.cache);
    let sweep_interval = cache_config.sweep_interval();
    let content = Arc::new(ContentService::new(source, store.clone(), cache_config));
    let state = GatewayState::new(content, settings.admin.clone());

    // Periodic expired-entry sweep; memory hygiene, never correctness.
    let sweep_store = store.clone();
    let sweep_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.tick().await; // Skip the first immediate tick
        loop {
            interval.tick().await;
            let removed = sweep_store.sweep();
            if removed > 0 {
                tracing::debug!(
                    target = "portico::cache",
                    removed,
                    "sweep evicted expired entries"
                );
            }
        }
    });

    let result = serve_http(&settings, state).await;

    sweep_handle.abort();
    let _ = sweep_handle.await;

    result
}

async fn serve_http(settings: &config::Settings, state: GatewayState) -> Result<(), AppError> {
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "portico::startup",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal(drain: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!(
        target = "portico::shutdown",
        drain_seconds = drain.as_secs(),
        "shutdown signal received; draining connections"
    );

    // In-flight requests get the grace period, then the process goes down
    // regardless.
    tokio::spawn(async move {
        tokio::time::sleep(drain).await;
        warn!(
            target = "portico::shutdown",
            "drain deadline exceeded; exiting"
        );
        process::exit(0);
    });
}
