//! Request handlers. Each one is stateless apart from the shared, read-only
//! [`AppState`].

use crate::error::HandlerError;
use crate::validation::BidForm;
use crate::views::{self, Notice};
use crate::AppState;
use auction_core::Receipt;
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use ethers::utils::to_checksum;
use serde_json::json;
use tracing::{error, info, warn};

fn render(state: &AppState, status: StatusCode, notice: Option<&Notice>) -> Response {
    (status, Html(views::home(&state.contract_display(), notice))).into_response()
}

fn render_failure(state: &AppState, route: &str, err: HandlerError) -> Response {
    match &err {
        HandlerError::Validation(e) => {
            warn!(route, reason = %e, "Rejected invalid input");
        }
        HandlerError::Chain(e) => {
            error!(route, kind = e.kind(), error = %e, "Contract interaction failed");
        }
    }
    render(state, err.status(), Some(&err.notice()))
}

fn bid_summary(ether: &str, wei: &str, bidder: &str, receipt: &Receipt) -> String {
    let block = receipt
        .block_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "Bid of {} ether ({} wei) for {} confirmed in block {} (tx {:?})",
        ether, wei, bidder, block, receipt.transaction_hash
    )
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Response {
    render(&state, StatusCode::OK, None)
}

/// `GET /error`
pub async fn error_page() -> Html<String> {
    Html(views::error_page())
}

/// `POST /bid`
pub async fn place_bid(State(state): State<AppState>, Form(form): Form<BidForm>) -> Response {
    let bid = match form.validate() {
        Ok(bid) => bid,
        Err(e) => return render_failure(&state, "/bid", e.into()),
    };

    let bidder = to_checksum(&bid.bidder, None);
    match state.binding.bid(bid.bidder, bid.amount_wei, state.bid_gas).await {
        Ok(receipt) => {
            info!(
                bidder = %bidder,
                amount_wei = %bid.amount_wei,
                tx_hash = ?receipt.transaction_hash,
                "Bid confirmed"
            );
            let summary = bid_summary(
                &bid.amount_ether.to_string(),
                &bid.amount_wei.to_string(),
                &bidder,
                &receipt,
            );
            render(&state, StatusCode::OK, Some(&Notice::Success(summary)))
        }
        Err(e) => render_failure(&state, "/bid", e.into()),
    }
}

/// `POST /highestbidder`
pub async fn highest_bidder(State(state): State<AppState>) -> Response {
    match state.binding.highest_bidder().await {
        Ok(bidder) => {
            let notice = Notice::Success(format!("Highest bidder: {}", to_checksum(&bidder, None)));
            render(&state, StatusCode::OK, Some(&notice))
        }
        Err(e) => render_failure(&state, "/highestbidder", e.into()),
    }
}

/// `POST /highestbid`, shown in wei
pub async fn highest_bid(State(state): State<AppState>) -> Response {
    match state.binding.highest_bid().await {
        Ok(amount) => {
            let notice = Notice::Success(format!("Highest bid: {} wei", amount));
            render(&state, StatusCode::OK, Some(&notice))
        }
        Err(e) => render_failure(&state, "/highestbid", e.into()),
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    let node_connected = state.node.is_connected().await;
    let status_code = if node_connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if node_connected { "ok" } else { "degraded" },
        "node_connected": node_connected,
        "contract": state.contract_display(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    (status_code, Json(body)).into_response()
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.binding.lifecycle().metrics().encode() {
        Ok(output) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
