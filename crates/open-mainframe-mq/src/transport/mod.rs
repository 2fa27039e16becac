//! Transport seam: the MQI capability interface behind the queue manager.
//!
//! A [`TransportProvider`] is picked when the [`QueueManager`] is built and
//! asked for a [`Transport`] on every `connect`. Two providers ship with the
//! crate:
//!
//! - [`DynamicLibraryProvider`] loads the MQ client (`libmqic_r`) or server
//!   (`libmqm_r`) library at connect time and calls through its entry points.
//! - [`InMemoryProvider`] runs an in-process queue manager with the same
//!   semantics, for tests and embedded use.
//!
//! [`QueueManager`]: crate::QueueManager

pub mod ffi;
pub mod loader;
pub mod memory;
pub mod native;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::admin::{Command, ResponseItem};
use crate::config::ConnectOptions;
use crate::error::Status;
use crate::structures::{MqPmo, Mqgmo, Mqmd, Mqod};

pub use loader::{DynamicLibraryProvider, EntryPoint, MqLibrary};
pub use memory::InMemoryProvider;

/// Which MQ library flavour to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// MQ client over a network channel.
    Client,
    /// Server bindings to a queue manager on this host.
    Local,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Connection handle (MQHCONN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hconn(pub i32);

/// Object handle (MQHOBJ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hobj(pub i32);

/// The MQI calls the queue manager and queues are built on.
///
/// Every call returns `Err(status)` when the completion code is not
/// MQCC_OK. Implementations are used by one connection at a time; the
/// caller serialises access.
pub trait Transport: Send {
    /// MQCONNX.
    fn connect(&mut self, q_mgr_name: &str, options: &ConnectOptions) -> Result<Hconn, Status>;

    /// MQDISC.
    fn disconnect(&mut self, hconn: Hconn) -> Result<(), Status>;

    /// MQOPEN.
    fn open(&mut self, hconn: Hconn, od: &mut Mqod, options: i32) -> Result<Hobj, Status>;

    /// MQCLOSE.
    fn close(&mut self, hconn: Hconn, hobj: Hobj, options: i32) -> Result<(), Status>;

    /// MQPUT. `data` is the complete message body including any headers.
    fn put(
        &mut self,
        hconn: Hconn,
        hobj: Hobj,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<(), Status>;

    /// MQPUT1.
    fn put1(
        &mut self,
        hconn: Hconn,
        od: &mut Mqod,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<(), Status>;

    /// MQGET. `data_length` receives the full message length, including
    /// when the buffer was too small.
    fn get(
        &mut self,
        hconn: Hconn,
        hobj: Hobj,
        md: &mut Mqmd,
        gmo: &mut Mqgmo,
        buffer: &mut [u8],
        data_length: &mut usize,
    ) -> Result<(), Status>;

    /// MQINQ for integer attributes.
    fn inquire(&mut self, hconn: Hconn, hobj: Hobj, selectors: &[i32]) -> Result<Vec<i32>, Status>;

    /// MQSET for integer attributes.
    fn set(&mut self, hconn: Hconn, hobj: Hobj, attributes: &[(i32, i32)]) -> Result<(), Status>;

    /// MQBEGIN.
    fn begin(&mut self, hconn: Hconn) -> Result<(), Status>;

    /// MQCMIT.
    fn commit(&mut self, hconn: Hconn) -> Result<(), Status>;

    /// MQBACK.
    fn backout(&mut self, hconn: Hconn) -> Result<(), Status>;

    /// mqExecute over admin bags.
    fn execute(&mut self, hconn: Hconn, command: &Command) -> Result<Vec<ResponseItem>, Status>;

    /// Unbind the transport. Must be safe to call more than once.
    fn release(&mut self);
}

/// Produces a [`Transport`] for a connection attempt.
pub trait TransportProvider: Send + Sync {
    /// Bind a transport for `mode`. Fails when the binding cannot be made.
    fn load(&self, mode: TransportMode, options: &ConnectOptions) -> crate::Result<Box<dyn Transport>>;
}

/// The provider used when none is given explicitly.
pub fn default_provider() -> Arc<dyn TransportProvider> {
    Arc::new(DynamicLibraryProvider)
}
