#![forbid(unsafe_code)]

use folio_server::{build_router, ApiConfig, AppState, HttpPageFetcher};
use folio_store::Database;
use std::env;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("FOLIO_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env_string("FOLIO_BIND_ADDR", "0.0.0.0:8080");
    let defaults = ApiConfig::default();
    let api_cfg = ApiConfig {
        max_body_bytes: env_usize("FOLIO_MAX_BODY_BYTES", defaults.max_body_bytes),
        meta_fetch_timeout: env_duration_ms(
            "FOLIO_META_FETCH_TIMEOUT_MS",
            defaults.meta_fetch_timeout.as_millis() as u64,
        ),
        meta_user_agent: env_string("FOLIO_META_USER_AGENT", &defaults.meta_user_agent),
        session_secret: env_string("FOLIO_SESSION_SECRET", &defaults.session_secret),
        session_ttl: Duration::from_secs(env_u64(
            "FOLIO_SESSION_TTL_SECS",
            defaults.session_ttl.as_secs(),
        )),
        database_path: env_string("FOLIO_DB_PATH", &defaults.database_path),
    };
    if api_cfg.session_secret == defaults.session_secret {
        warn!("FOLIO_SESSION_SECRET not set; using the insecure development secret");
    }

    let fetcher = HttpPageFetcher::new(api_cfg.meta_fetch_timeout, &api_cfg.meta_user_agent)
        .map_err(|e| format!("http client init failed: {e}"))?;
    let db = Arc::new(Database::new(&api_cfg.database_path));
    let state = AppState::new(db.clone(), api_cfg, Arc::new(fetcher));
    let app = build_router(state.clone());

    // Ready only after the store answered the first probe.
    state.ready.store(false, Ordering::Relaxed);
    match db.ping().await {
        Ok(()) => state.ready.store(true, Ordering::Relaxed),
        Err(e) => error!("initial store probe failed: {e}"),
    }

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("folio-server listening on {bind_addr}");

    let accepting = state.accepting_requests.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            accepting.store(false, Ordering::Relaxed);
            let drain_ms = env_u64("FOLIO_SHUTDOWN_DRAIN_MS", 5000);
            tokio::time::sleep(Duration::from_millis(drain_ms)).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
