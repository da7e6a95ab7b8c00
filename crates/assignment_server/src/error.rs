use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Rejections the `/assignment` handler can produce (§4.8). Each variant
/// maps to a distinct HTTP status; the body is a small JSON object rather
/// than a bare string, matching `via_verifier_coordinator`'s API error
/// shape.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentServerError {
    #[error("feeToken must be the zero address")]
    NonNativeFeeToken,
    #[error("txListHash must be non-zero")]
    ZeroTxListHash,
    #[error("tier {tier} fee {offered} below configured minimum {minimum}")]
    FeeBelowMinimum { tier: u16, offered: u128, minimum: u128 },
    #[error("expiry {expiry} exceeds configured maximum {max}")]
    ExpiryTooFar { expiry: u64, max: u64 },
    #[error("prover capacity exhausted")]
    CapacityExhausted,
    #[error("prover balance below required liveness bond")]
    InsufficientBond,
    #[error(transparent)]
    Rpc(#[from] rollup_rpc::RpcError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AssignmentServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            AssignmentServerError::NonNativeFeeToken
            | AssignmentServerError::ZeroTxListHash
            | AssignmentServerError::FeeBelowMinimum { .. }
            | AssignmentServerError::ExpiryTooFar { .. } => StatusCode::BAD_REQUEST,
            AssignmentServerError::CapacityExhausted | AssignmentServerError::InsufficientBond => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AssignmentServerError::Rpc(_) | AssignmentServerError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        tracing::warn!(err = %self, "assignment request rejected");
        (status, axum::Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
