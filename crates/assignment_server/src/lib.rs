//! HTTP contract the prover side exposes to proposers (§4.8): `/status`
//! and `/assignment`. `/signedBlocks` (an optional guardian-only record
//! store) lives in `guardian.rs`; both are assembled into one router the
//! way `via_verifier_coordinator::coordinator::api_decl::RestApi` nests
//! its own routes under a shared `Router`.

pub mod api;
pub mod error;
pub mod guardian;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy_signer_local::PrivateKeySigner;
use capacity_manager::CapacityManager;
use rollup_config::{ClientConfig, ProverConfig};
use rollup_rpc::RpcClient;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

pub use api::AssignmentServerState;
pub use error::AssignmentServerError;

const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the assignment server's router plus a ready-to-bind listener
/// address, and runs it until `stop_receiver` fires.
pub async fn run(
    rpc: Arc<RpcClient>,
    config: Arc<ClientConfig>,
    prover_config: Arc<ProverConfig>,
    signer: PrivateKeySigner,
    capacity: Arc<CapacityManager>,
    mut stop_receiver: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let bind_addr = prover_config.http_bind_addr;
    let state = Arc::new(AssignmentServerState { rpc, config, prover_config, signer, capacity });
    let router = into_router(state);

    tracing::info!(%bind_addr, "assignment server listening");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = stop_receiver.changed().await;
            tracing::info!("stop signal received, assignment server shutting down");
        })
        .await?;
    Ok(())
}

fn into_router(state: Arc<AssignmentServerState>) -> axum::Router<()> {
    axum::Router::new()
        .route("/status", axum::routing::get(api::status))
        .route("/assignment", axum::routing::post(api::assignment))
        .route("/signedBlocks", axum::routing::get(guardian::signed_blocks))
        .route("/signedBlocks", axum::routing::post(guardian::record_signed_block))
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::new(API_TIMEOUT))
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
}

#[allow(dead_code)]
fn bound_addr(addr: SocketAddr) -> SocketAddr {
    addr
}
