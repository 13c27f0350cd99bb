//! Classify the tool's stderr into identity-rejection signatures.
//!
//! Only used for diagnostics: the executor moves on to the next identity
//! whatever the classification says.

/// What kind of rejection a failed attempt looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// HTTP 400.
    BadRequest,
    /// HTTP 403 / "Forbidden".
    Forbidden,
    /// HTTP 412 / precondition failure.
    PreconditionFailed,
    /// HTTP 429.
    Throttled,
    /// No recognizable signature.
    Other,
}

impl Rejection {
    /// True when the source most likely refused this particular client identity.
    pub fn is_identity_rejection(self) -> bool {
        !matches!(self, Rejection::Other)
    }
}

pub fn classify_stderr(stderr: &str) -> Rejection {
    let text = stderr.to_ascii_lowercase();
    if text.contains("http error 403") || text.contains("forbidden") {
        Rejection::Forbidden
    } else if text.contains("http error 400") || text.contains("bad request") {
        Rejection::BadRequest
    } else if text.contains("http error 412") || text.contains("precondition") {
        Rejection::PreconditionFailed
    } else if text.contains("http error 429") || text.contains("too many requests") {
        Rejection::Throttled
    } else {
        Rejection::Other
    }
}
