//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown message `type`,
    /// or a missing/mistyped field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A `join` named a game type the server doesn't offer.
    #[error("unknown game type: {0}")]
    UnknownGame(String),
}

impl ProtocolError {
    /// The short, client-facing reason for an `invalid` reply.
    pub fn reason(&self) -> String {
        match self {
            #[cfg(feature = "json")]
            Self::Encode(_) => "internal encode failure".into(),
            #[cfg(feature = "json")]
            Self::Decode(e) => decode_reason(e).into(),
            Self::InvalidMessage(msg) => msg.clone(),
            Self::UnknownGame(name) => format!("unknown game type: {name}"),
        }
    }
}

#[cfg(feature = "json")]
fn decode_reason(e: &serde_json::Error) -> &'static str {
    use serde_json::error::Category;

    match e.classify() {
        Category::Syntax | Category::Eof | Category::Io => "malformed json",
        Category::Data => {
            let text = e.to_string();
            if text.contains("unknown variant")
                || text.contains("missing field `type`")
            {
                "unknown message type"
            } else {
                "missing or invalid field"
            }
        }
    }
}
