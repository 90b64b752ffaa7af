//! Auction Server - HTTP front end for a deployed auction contract

pub mod error;
pub mod handlers;
pub mod startup;
pub mod validation;
pub mod views;

use auction_core::{ContractBinding, GasSettings, NodeRpc};
use axum::{
    routing::{get, post},
    Router,
};
use ethers::utils::to_checksum;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::HandlerError;
pub use validation::{BidForm, ValidBid, ValidationError};

/// Shared, read-only request state. Holding a [`ContractBinding`] means the
/// contract has been deployed.
#[derive(Clone)]
pub struct AppState {
    pub binding: Arc<ContractBinding>,
    pub bid_gas: GasSettings,
    pub node: Arc<dyn NodeRpc>,
}

impl AppState {
    pub fn new(binding: Arc<ContractBinding>, bid_gas: GasSettings) -> Self {
        let node = binding.lifecycle().node().clone();
        Self {
            binding,
            bid_gas,
            node,
        }
    }

    pub fn contract_display(&self) -> String {
        to_checksum(&self.binding.address(), None)
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/error", get(handlers::error_page))
        .route("/bid", post(handlers::place_bid))
        .route("/highestbidder", post(handlers::highest_bidder))
        .route("/highestbid", post(handlers::highest_bid))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
