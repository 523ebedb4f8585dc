//! Status-code classification shared by the HTTP adapters.

use reqwest::StatusCode;

use crate::BackendError;

/// Maps a backend HTTP status onto the stable error taxonomy. Backends agree
/// on these codes closely enough that one table serves all three.
pub(crate) fn classify_status(status: StatusCode, message: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => BackendError::timeout(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::invalid_request(message)
        }
        _ if status.is_server_error() => BackendError::unavailable(message),
        _ => BackendError::unknown(message),
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::timeout(err.to_string())
    } else {
        BackendError::unavailable(err.to_string())
    }
}
