use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use fleetlock_cluster::ClusterClient;
use fleetlock_coordinator::RebootCoordinator;
use fleetlock_core::validate_groups;
use fleetlock_manager::LockManager;

use fleetlock_server::cli::{Cli, Command};
use fleetlock_server::config::Config;
use fleetlock_server::error::ServerError;
use fleetlock_server::{api, config, storage_factory, tls};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Command::Version) = cli.command {
        println!("fleetlock-server {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(err) = run(cli).await {
        eprintln!("Fatal: {err}");
        std::process::exit(1);
    }
}

const VALID_LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = load_config(&cli.config, cli.env)?;

    init_tracing(&config.log_level)?;
    config.server.ssl.validate().map_err(ServerError::Config)?;
    validate_groups(&config.groups).map_err(|e| ServerError::Config(e.to_string()))?;

    let kube_client = match &config.kubernetes {
        Some(cluster_cfg) => Some(build_kube_client(cluster_cfg.kubeconfig.as_deref()).await?),
        None => None,
    };

    let group_names: Vec<String> = config.groups.keys().cloned().collect();
    let storage = storage_factory::create_storage_backend(
        &config.storage,
        &group_names,
        kube_client.clone(),
        config.kubernetes.as_ref().and_then(|k| k.namespace.as_deref()),
    )
    .await?;

    let manager = LockManager::new(&config.groups, storage);

    let cluster = match (&config.kubernetes, &kube_client) {
        (Some(cluster_cfg), Some(client)) => Some(ClusterClient::new(
            client.clone(),
            cluster_cfg.namespace.clone(),
            cluster_cfg.drain_timeout_seconds,
            cluster_cfg.drain_retries,
        )),
        _ => None,
    };

    let coordinator = Arc::new(RebootCoordinator::new(manager, cluster));
    let app = api::router(api::AppState { coordinator });

    let addr = config.server.effective_listen().to_string();
    let shutdown_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_seconds);

    if config.server.ssl.enabled {
        serve_tls(&addr, app, &config.server.ssl, shutdown_timeout).await
    } else {
        serve_plain(&addr, app, shutdown_timeout).await
    }
}

fn load_config(path: &str, expand_env: bool) -> Result<Config, ServerError> {
    if !Path::new(path).exists() {
        info!(%path, "config file not found, using defaults");
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let raw = if expand_env { expand_env_vars(&raw) } else { raw };
    Ok(serde_yaml_ng::from_str(&raw)?)
}

/// Expand `${VAR}` references using the process environment. Unknown
/// variables are left untouched.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|(_, c)| *c == '{') {
            chars.next();
            let mut name = String::new();
            for (_, c) in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            match std::env::var(&name) {
                Ok(value) => out.push_str(&value),
                Err(_) => {
                    out.push_str("${");
                    out.push_str(&name);
                    out.push('}');
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn init_tracing(log_level: &str) -> Result<(), ServerError> {
    if !VALID_LOG_LEVELS.contains(&log_level) {
        return Err(ServerError::UnknownLogLevel(log_level.to_owned()));
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn build_kube_client(kubeconfig: Option<&str>) -> Result<kube::Client, ServerError> {
    let config = if let Some(path) = kubeconfig {
        let kubeconfig = kube::config::Kubeconfig::read_from(path)
            .map_err(|e| ServerError::Config(format!("failed to read kubeconfig {path}: {e}")))?;
        kube::Config::from_custom_kubeconfig(kubeconfig, &kube::config::KubeConfigOptions::default())
            .await
            .map_err(|e| ServerError::Config(format!("failed to build kube config: {e}")))?
    } else {
        kube::Config::infer()
            .await
            .map_err(|e| ServerError::Config(format!("failed to infer kube config: {e}")))?
    };
    Ok(kube::Client::try_from(config)?)
}

async fn serve_plain(
    addr: &str,
    app: axum::Router,
    shutdown_timeout: std::time::Duration,
) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, ssl = false, "fleetlock-server listening");

    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    match tokio::time::timeout(shutdown_timeout, serve).await {
        Ok(result) => result?,
        Err(_elapsed) => {
            tracing::warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "in-flight requests did not finish before the shutdown timeout, forcing exit"
            );
        }
    }

    info!(timeout_secs = shutdown_timeout.as_secs(), "fleetlock-server shut down");
    Ok(())
}

async fn serve_tls(
    addr: &str,
    app: axum::Router,
    ssl: &config::TlsConfig,
    shutdown_timeout: std::time::Duration,
) -> Result<(), ServerError> {
    use hyper_util::rt::{TokioExecutor, TokioIo};
    use tower::ServiceExt;

    let tls_config = tls::build_server_config(ssl)?;
    let acceptor = tokio_rustls::TlsAcceptor::from(tls_config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, ssl = true, "fleetlock-server listening");

    let mut shutdown = std::pin::pin!(shutdown_signal());
    let mut connections = Vec::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let Ok((stream, _remote)) = accepted else { continue };
                let acceptor = acceptor.clone();
                let app = app.clone();
                let handle = tokio::spawn(async move {
                    let Ok(tls_stream) = acceptor.accept(stream).await else { return };
                    let io = TokioIo::new(tls_stream);
                    let hyper_service = hyper::service::service_fn(move |request| {
                        app.clone().oneshot(request)
                    });
                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, hyper_service)
                        .await;
                });
                connections.retain(|h: &tokio::task::JoinHandle<()>| !h.is_finished());
                connections.push(handle);
            }
            () = &mut shutdown => break,
        }
    }

    let drain = futures::future::join_all(connections);
    if tokio::time::timeout(shutdown_timeout, drain).await.is_err() {
        tracing::warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "in-flight connections did not finish before the shutdown timeout, forcing exit"
        );
    }

    info!(timeout_secs = shutdown_timeout.as_secs(), "fleetlock-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
