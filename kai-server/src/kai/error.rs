//! Booking site client error types.

/// Errors from talking to the booking site.
#[derive(Debug, thiserror::Error)]
pub enum KaiError {
    /// Transport failure or timeout
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The site answered with a non-success status where one was required
    #[error("upstream returned {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    /// The intermediate page had no meta refresh marker
    #[error("redirect marker not found; the booking site layout may have changed")]
    RedirectNotFound,

    /// The meta refresh marker pointed somewhere unusable
    #[error("invalid redirect target: {0}")]
    InvalidRedirect(String),
}
