//! # huemud: bridge emulator daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load settings (file, env vars) and initialise logging
//! - Open the configuration store and seed hub settings into it
//! - Construct the hub client and the device cache service
//! - Spawn the discovery responder and the periodic refresh
//! - Bind the HTTP listener and serve the bridge protocol
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod settings;

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use huemu_adapter_home_assistant::HomeAssistantClient;
use huemu_adapter_http_axum::router;
use huemu_adapter_http_axum::state::{Advertise, AppState};
use huemu_adapter_ssdp::Responder;
use huemu_adapter_storage_json::JsonConfigRepository;
use huemu_app::ports::{ConfigRepository, HubPort};
use huemu_app::services::bridge_service::BridgeService;

use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.logging.filter))
        .init();

    // Configuration store
    let repo = JsonConfigRepository::new(&settings.storage.path);
    let mut stored = repo.get().await?;
    if !stored.hub_settings().is_complete()
        && let Some(seed) = settings.hub_seed()
    {
        stored.hub_url = seed.url;
        stored.hub_token = seed.token;
        repo.save(&stored).await?;
        tracing::info!("seeded hub settings into the stored configuration");
    }

    // Hub client
    let hub = HomeAssistantClient::new(settings.hub_timeout())?;
    if let Err(err) = hub.configure(&stored.hub_settings()) {
        tracing::warn!(error = %err, "stored hub settings are unusable");
    }
    if !hub.is_configured() {
        tracing::warn!("hub is not configured, lights stay empty until it is set via /admin/config");
    }

    let advertise_ip = settings
        .server
        .advertise_ip
        .clone()
        .or_else(|| stored.local_ip.clone().filter(|ip| !ip.trim().is_empty()))
        .unwrap_or_else(detect_local_ip);

    let bridge = Arc::new(BridgeService::with_cooldown(hub, repo, settings.cooldown()));
    let cancel = CancellationToken::new();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    // Discovery
    if settings.discovery.enabled {
        match huemu_adapter_ssdp::bind_multicast(&settings.ssdp_config()) {
            Ok(socket) => {
                let responder = Responder::new(&advertise_ip, settings.server.port);
                tasks.push(tokio::spawn(huemu_adapter_ssdp::serve(
                    socket,
                    responder,
                    cancel.clone(),
                )));
            }
            Err(err) => tracing::warn!(error = %err, "discovery disabled"),
        }
    }

    // Periodic refresh
    {
        let bridge = Arc::clone(&bridge);
        let cancel = cancel.clone();
        let period = settings.refresh_interval();
        tasks.push(tokio::spawn(async move {
            bridge.run_refresh_loop(period, cancel).await;
        }));
    }

    // HTTP
    let state = AppState::from_arc(
        bridge,
        Advertise {
            ip: advertise_ip.clone(),
            port: settings.server.port,
        },
    );
    let app = router::build(state);

    let bind_addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, %advertise_ip, "huemud listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    for task in tasks {
        if let Err(err) = task.await {
            tracing::warn!(error = %err, "background task ended abnormally");
        }
    }
    Ok(())
}

/// Primary IPv4 address, found by routing a UDP socket towards a public
/// address. No packet is sent.
fn detect_local_ip() -> String {
    let detected = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip());
    match detected {
        Ok(ip @ IpAddr::V4(v4)) if !v4.is_unspecified() => ip.to_string(),
        Ok(ip) => {
            tracing::warn!(%ip, "no usable IPv4 address detected, advertising loopback");
            Ipv4Addr::LOCALHOST.to_string()
        }
        Err(err) => {
            tracing::warn!(error = %err, "local address detection failed, advertising loopback");
            Ipv4Addr::LOCALHOST.to_string()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
