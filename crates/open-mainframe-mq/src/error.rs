//! MQ error and status types.
//!
//! Every MQI call reports a completion code and a reason code. [`Status`]
//! carries that pair; [`Completion`] is what an operation hands back when
//! the owning queue manager was configured not to raise on transport
//! failures; [`MqError`] covers everything that is always raised.

use miette::Diagnostic;
use thiserror::Error;

use crate::constants::{self, MQCC_FAILED, MQCC_OK, MQCC_WARNING, MQRC_NONE};

// ---------------------------------------------------------------------------
//  Status
// ---------------------------------------------------------------------------

/// Completion code / reason code pair returned by every MQI call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    /// MQCC_OK, MQCC_WARNING or MQCC_FAILED.
    pub comp_code: i32,
    /// MQRC_* reason code.
    pub reason_code: i32,
}

impl Status {
    /// Successful completion.
    pub const OK: Status = Status {
        comp_code: MQCC_OK,
        reason_code: MQRC_NONE,
    };

    pub fn new(comp_code: i32, reason_code: i32) -> Self {
        Self {
            comp_code,
            reason_code,
        }
    }

    /// A failed completion with the given reason.
    pub fn failed(reason_code: i32) -> Self {
        Self::new(MQCC_FAILED, reason_code)
    }

    /// A warning completion with the given reason.
    pub fn warning(reason_code: i32) -> Self {
        Self::new(MQCC_WARNING, reason_code)
    }

    pub fn is_ok(&self) -> bool {
        self.comp_code == MQCC_OK
    }

    /// Symbolic name of the reason code (e.g. `MQRC_NO_MSG_AVAILABLE`).
    pub fn reason(&self) -> &'static str {
        constants::reason_text(self.reason_code)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "comp_code={} reason_code={} ({})",
            self.comp_code,
            self.reason_code,
            self.reason()
        )
    }
}

// ---------------------------------------------------------------------------
//  Completion
// ---------------------------------------------------------------------------

/// Outcome of an operation that did not raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Completion {
    /// The call completed with MQCC_OK.
    Ok,
    /// A get found no message within the wait interval.
    NoMessage,
    /// The transport reported a failure and `exception_on_error` is off.
    Failed(Status),
}

impl Completion {
    pub fn is_ok(&self) -> bool {
        matches!(self, Completion::Ok)
    }

    /// The transport status behind a suppressed failure.
    pub fn status(&self) -> Option<Status> {
        match self {
            Completion::Failed(status) => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
//  MqError
// ---------------------------------------------------------------------------

/// Errors raised by the MQ client.
#[derive(Debug, Error, Diagnostic)]
pub enum MqError {
    /// The MQ library could not be loaded.
    #[error("failed to load MQ library '{library}': {detail}")]
    #[diagnostic(
        code(mq::binding_load),
        help("install the MQ client/server runtime or set `library_path`")
    )]
    BindingLoad {
        /// Library name or path that was requested.
        library: String,
        /// Loader diagnostic.
        detail: String,
    },

    /// A mandatory MQI entry point is missing from the loaded library.
    #[error("failed to find API {symbol} in MQ library '{library}'")]
    #[diagnostic(code(mq::missing_entry_point))]
    MissingEntryPoint {
        /// Library name or path.
        library: String,
        /// The unresolved symbol.
        symbol: &'static str,
    },

    /// Operation requires a connected queue manager.
    #[error("{operation}: queue manager '{queue_manager}' is not connected")]
    #[diagnostic(code(mq::not_connected), help("call connect() first"))]
    NotConnected {
        operation: &'static str,
        queue_manager: String,
    },

    /// `connect` on a queue manager that is already connected.
    #[error("queue manager '{queue_manager}' is already connected")]
    #[diagnostic(code(mq::already_connected))]
    AlreadyConnected { queue_manager: String },

    /// Operation requires an open queue.
    #[error("{operation}: queue '{queue}' is not open")]
    #[diagnostic(code(mq::queue_not_open))]
    QueueNotOpen {
        operation: &'static str,
        queue: String,
    },

    /// `open` on a queue that is already open.
    #[error("queue '{queue}' is already open")]
    #[diagnostic(code(mq::queue_already_open))]
    QueueAlreadyOpen { queue: String },

    /// Unrecognised or ill-typed field passed to a constructor.
    #[error("invalid field '{field}': {reason}")]
    #[diagnostic(code(mq::invalid_field))]
    InvalidField { field: String, reason: String },

    /// Inconsistent option combination.
    #[error("invalid options for {operation}: {reason}")]
    #[diagnostic(code(mq::invalid_options))]
    InvalidOptions {
        operation: &'static str,
        reason: String,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {message}")]
    #[diagnostic(code(mq::config))]
    Config { message: String },

    /// An MQI call returned a non-zero completion code.
    #[error("{operation}() failed: comp_code={comp_code}, reason_code={reason_code}, reason={reason}")]
    #[diagnostic(code(mq::transport))]
    Transport {
        /// The failing operation (`connect`, `put`, `get`, ...).
        operation: &'static str,
        comp_code: i32,
        reason_code: i32,
        /// Symbolic reason text.
        reason: &'static str,
    },
}

impl MqError {
    pub(crate) fn transport(operation: &'static str, status: Status) -> Self {
        Self::Transport {
            operation,
            comp_code: status.comp_code,
            reason_code: status.reason_code,
            reason: status.reason(),
        }
    }

    /// The transport status for [`MqError::Transport`].
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Transport {
                comp_code,
                reason_code,
                ..
            } => Some(Status::new(*comp_code, *reason_code)),
            _ => None,
        }
    }

    /// Whether this is a lifecycle-state error.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. }
                | Self::AlreadyConnected { .. }
                | Self::QueueNotOpen { .. }
                | Self::QueueAlreadyOpen { .. }
        )
    }

    /// Whether the transport library could not be bound.
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            Self::BindingLoad { .. } | Self::MissingEntryPoint { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MQRC_NO_MSG_AVAILABLE;

    #[test]
    fn test_status_reason_text() {
        let status = Status::failed(MQRC_NO_MSG_AVAILABLE);
        assert!(!status.is_ok());
        assert_eq!(status.reason(), "MQRC_NO_MSG_AVAILABLE");
        assert!(Status::OK.is_ok());
    }

    #[test]
    fn test_transport_error_carries_status() {
        let err = MqError::transport("put", Status::failed(2085));
        assert_eq!(err.status(), Some(Status::failed(2085)));
        let text = err.to_string();
        assert!(text.contains("put() failed"));
        assert!(text.contains("MQRC_UNKNOWN_OBJECT_NAME"));
    }

    #[test]
    fn test_error_classes() {
        let state = MqError::QueueNotOpen {
            operation: "get",
            queue: "TEST.Q".into(),
        };
        assert!(state.is_state_error());
        assert!(!state.is_binding_error());

        let binding = MqError::MissingEntryPoint {
            library: "libmqic_r.so".into(),
            symbol: "MQCONNX",
        };
        assert!(binding.is_binding_error());
        assert!(binding.to_string().contains("MQCONNX"));
    }

    #[test]
    fn test_completion_status() {
        assert!(Completion::Ok.is_ok());
        assert!(!Completion::NoMessage.is_ok());
        let failed = Completion::Failed(Status::warning(2079));
        assert_eq!(failed.status().map(|s| s.comp_code), Some(MQCC_WARNING));
    }
}
