use std::time::Duration;

/// Why a chat exchange failed.
///
/// The widget shows the same apology for every variant; the distinction only
/// matters for logs.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("request to chat backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("chat backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed chat backend response: {0}")]
    MalformedBody(String),

    #[error("chat request task ended before answering: {0}")]
    Aborted(String),
}

/// Coarse classification of a [`ChatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never completed.
    Transport,
    /// A response came back but its status or shape is unusable.
    Protocol,
}

impl ChatError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ChatError::Transport(_) | ChatError::Timeout(_) | ChatError::Aborted(_) => {
                FailureKind::Transport
            }
            ChatError::Status { .. } | ChatError::MalformedBody(_) => FailureKind::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            ChatError::Timeout(Duration::from_secs(1)).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            ChatError::Status { status: 500, body: String::new() }.kind(),
            FailureKind::Protocol
        );
        assert_eq!(
            ChatError::MalformedBody("missing field".into()).kind(),
            FailureKind::Protocol
        );
    }
}
