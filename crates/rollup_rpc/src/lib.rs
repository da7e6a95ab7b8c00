//! Unified facade over the L1 node, the L2 execution engine (both its
//! plain JSON-RPC surface and its Engine API), and the protocol contracts
//! deployed on L1.
//!
//! Every other crate in this workspace reaches the outside world through
//! here; nothing else opens a websocket or holds a provider handle. This
//! mirrors the shape of `via_btc_sender`/`via_btc_watch`'s `BitcoinClient`
//! and the indexer's main-node RPC client: one typed struct per external
//! system, wired together once at startup and shared behind an `Arc`.

pub mod blob;
pub mod client;
pub mod custom_error;
pub mod engine;
pub mod error;
pub mod l1_origin_store;
pub mod pool;
pub mod reorg;
mod wire_calls;

pub use blob::BlobFetcher;
pub use client::{L1Client, L2Client, ProtocolClient, RpcClient};
pub use custom_error::decode_contract_error;
pub use engine::EngineApiClient;
pub use error::RpcError;
pub use l1_origin_store::L1OriginStore;
pub use pool::PreBuiltTxList;
pub use reorg::{check_l1_reorg, ReorgCheckResult};
