//! IBM MQ client library.
//!
//! This crate provides:
//!
//! - **Queue Manager** - connect/disconnect, units of work, one-shot puts,
//!   replies, dead-letter puts and PCF/MQSC administration
//! - **Queues** - open/close, put, get with wait and truncation handling,
//!   browse, iteration, integer attribute inquire/set
//! - **Messages** - descriptor, payload and dead-letter headers
//! - **Data Structures** - MQMD, MQOD, MQGMO, MQPMO, MQDLH
//! - **Transports** - runtime binding of the MQ client or server library,
//!   plus an in-process queue manager for tests
//! - **Configuration** - connection options in code or TOML
//!
//! Errors from the queue manager follow the connection's
//! `exception_on_error` setting: raised as [`MqError::Transport`], or
//! returned as [`Completion::Failed`] with the status left on the object.

pub mod admin;
pub mod config;
pub mod constants;
pub mod error;
pub mod message;
mod mqi;
pub mod queue;
pub mod queue_manager;
pub mod structures;
pub mod transport;

pub use admin::{BagValue, Command, CommandCode, ResponseItem, Selector};
pub use config::ConnectOptions;
pub use error::{Completion, MqError, Status};
pub use message::{FieldValue, Header, Message};
pub use queue::{Browse, GetOptions, Messages, OpenMode, PutOptions, Queue, QueueOptions, Wait};
pub use queue_manager::{PutRequest, QueueManager};
pub use structures::{MqMsgType, MqPersistence, MqPmo, MqPriority, Mqdlh, Mqgmo, Mqmd, Mqod};
pub use transport::{
    DynamicLibraryProvider, InMemoryProvider, Transport, TransportMode, TransportProvider,
};

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MqError>;
