use crate::AbortReason;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The request's cancellation signal fired before the exchange finished.
    #[error("request aborted: {0}")]
    Aborted(AbortReason),
    /// URL passed to a [`Request`](crate::Request) constructor did not parse.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Failure raised by a plugin hook.
    #[error("plugin `{plugin}` failed: {message}")]
    Plugin {
        /// Descriptive name of the failing plugin.
        plugin: String,
        /// Error message text.
        message: String,
    },
    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Error from a custom transport or retry predicate.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error, typically from a custom [`Fetch`](crate::Fetch) implementation.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(err.into())
    }

    /// Builds a [`Error::Plugin`] for the named plugin.
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Returns `true` when the request timed out, either through a timeout
    /// signal or a `reqwest` timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Aborted(reason) => reason.is_timeout(),
            Self::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Error;
    use crate::AbortReason;

    #[test]
    fn timeout_classification() {
        assert!(Error::Aborted(AbortReason::Timeout(Duration::from_secs(1))).is_timeout());
        assert!(!Error::Aborted(AbortReason::Cancelled).is_timeout());
        assert!(!Error::plugin("auth", "missing token").is_timeout());
    }

    #[test]
    fn plugin_error_message_names_plugin() {
        let err = Error::plugin("auth", "missing token");
        assert_eq!(err.to_string(), "plugin `auth` failed: missing token");
    }
}
