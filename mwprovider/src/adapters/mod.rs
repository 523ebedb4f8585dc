//! Backend adapters: one module per backend family.

#[cfg(any(
    feature = "backend-anthropic",
    feature = "backend-gemini",
    feature = "backend-openai"
))]
mod http;

#[cfg(any(
    feature = "backend-anthropic",
    feature = "backend-gemini",
    feature = "backend-openai"
))]
pub(crate) use http::{classify_status, transport_error};

/// Tool payloads are arbitrary JSON; backends that want plain text get
/// strings verbatim and everything else as compact JSON.
#[cfg(any(feature = "backend-anthropic", feature = "backend-openai"))]
pub(crate) fn payload_text(payload: serde_json::Value) -> String {
    match payload {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(feature = "backend-anthropic")]
pub mod anthropic;

#[cfg(feature = "backend-gemini")]
pub mod gemini;

#[cfg(feature = "backend-openai")]
pub mod openai;
