use crate::validation::ValidationError;
use crate::views::Notice;
use auction_core::ChainError;
use axum::http::StatusCode;

/// Why a request failed. Bad input and contract failures stay separate all
/// the way to the rendered page.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Validation(_) => StatusCode::BAD_REQUEST,
            HandlerError::Chain(e) if e.is_outcome_unknown() => StatusCode::GATEWAY_TIMEOUT,
            HandlerError::Chain(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            HandlerError::Validation(e) => Notice::Invalid(e.to_string()),
            HandlerError::Chain(e) => Notice::ContractError {
                message: e.to_string(),
                outcome_unknown: e.is_outcome_unknown(),
            },
        }
    }
}
