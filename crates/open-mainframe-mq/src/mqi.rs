//! MQI connection state shared by a queue manager and its queues.
//!
//! One [`Connection`] sits behind an `Arc<Mutex<_>>`. The [`QueueManager`]
//! and every [`Queue`] opened from it hold a clone, so all calls against one
//! connection handle are serialised. The connection also keeps the registry
//! of open object handles: a queue only refers to its handle by registry id,
//! which is what lets `disconnect` invalidate queues it does not own.
//!
//! [`QueueManager`]: crate::QueueManager
//! [`Queue`]: crate::Queue

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::admin::{Command, ResponseItem};
use crate::config::ConnectOptions;
use crate::constants::{MQCC_WARNING, MQRC_NO_EXTERNAL_PARTICIPANTS};
use crate::error::{Completion, MqError, Status};
use crate::structures::{MqPmo, Mqmd, Mqod};
use crate::transport::{Hconn, Hobj, Transport, TransportProvider};

pub(crate) type SharedConnection = Arc<Mutex<Connection>>;

/// Lock the connection, recovering from a panic in another holder.
pub(crate) fn lock(connection: &SharedConnection) -> MutexGuard<'_, Connection> {
    connection.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Apply the `exception_on_error` policy to a failed call.
pub(crate) fn on_failure(
    operation: &'static str,
    status: Status,
    raise: bool,
) -> crate::Result<Completion> {
    if raise {
        return Err(MqError::transport(operation, status));
    }
    warn!(
        operation,
        comp_code = status.comp_code,
        reason_code = status.reason_code,
        reason = status.reason(),
        "MQ call failed"
    );
    Ok(Completion::Failed(status))
}

#[derive(Debug)]
struct OpenObject {
    hobj: Hobj,
    queue: String,
    close_options: i32,
}

// ---------------------------------------------------------------------------
//  Connection
// ---------------------------------------------------------------------------

pub(crate) struct Connection {
    name: String,
    options: ConnectOptions,
    provider: Arc<dyn TransportProvider>,
    transport: Option<Box<dyn Transport>>,
    hconn: Option<Hconn>,
    status: Status,
    in_unit_of_work: bool,
    objects: HashMap<u64, OpenObject>,
    next_object_id: u64,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("hconn", &self.hconn)
            .field("status", &self.status)
            .field("in_unit_of_work", &self.in_unit_of_work)
            .field("open_objects", &self.objects.len())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) fn new(options: ConnectOptions, provider: Arc<dyn TransportProvider>) -> Self {
        Self {
            name: options.q_mgr_name.clone(),
            options,
            provider,
            transport: None,
            hconn: None,
            status: Status::OK,
            in_unit_of_work: false,
            objects: HashMap::new(),
            next_object_id: 1,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn exception_on_error(&self) -> bool {
        self.options.exception_on_error
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.hconn.is_some()
    }

    pub(crate) fn in_unit_of_work(&self) -> bool {
        self.in_unit_of_work
    }

    /// Record that a syncpoint put or get has joined the unit of work.
    pub(crate) fn join_unit_of_work(&mut self) {
        self.in_unit_of_work = true;
    }

    fn not_connected(&self, operation: &'static str) -> MqError {
        MqError::NotConnected {
            operation,
            queue_manager: self.name.clone(),
        }
    }

    /// Record the outcome of a manager-level call.
    fn settle(&mut self, operation: &'static str, result: Result<(), Status>) -> crate::Result<Completion> {
        match result {
            Ok(()) => {
                self.status = Status::OK;
                Ok(Completion::Ok)
            }
            Err(status) => {
                self.status = status;
                on_failure(operation, status, self.options.exception_on_error)
            }
        }
    }

    /// Run one MQI call against the live connection.
    ///
    /// The outer error is the lifecycle check; the inner result is the
    /// transport's status, left for the caller to record.
    pub(crate) fn call<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut dyn Transport, Hconn) -> Result<T, Status>,
    ) -> crate::Result<Result<T, Status>> {
        let (Some(transport), Some(hconn)) = (self.transport.as_deref_mut(), self.hconn) else {
            return Err(self.not_connected(operation));
        };
        let trace = self.options.trace_level >= 1;
        if trace {
            debug!(queue_manager = %self.name, operation, "MQ call");
        }
        let result = f(transport, hconn);
        if trace {
            if let Err(status) = &result {
                debug!(
                    queue_manager = %self.name,
                    operation,
                    comp_code = status.comp_code,
                    reason_code = status.reason_code,
                    "MQ call completed"
                );
            }
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    //  Connect / disconnect
    // -----------------------------------------------------------------------

    pub(crate) fn connect(&mut self) -> crate::Result<Completion> {
        if self.is_connected() {
            return Err(MqError::AlreadyConnected {
                queue_manager: self.name.clone(),
            });
        }
        self.options.validate()?;
        let mode = self.options.mode();
        let mut transport = self.provider.load(mode, &self.options)?;

        match transport.connect(&self.name, &self.options) {
            Ok(hconn) => {
                info!(queue_manager = %self.name, mode = %mode, "connected to queue manager");
                self.transport = Some(transport);
                self.hconn = Some(hconn);
                self.in_unit_of_work = false;
                self.settle("connect", Ok(()))
            }
            Err(status) => {
                transport.release();
                self.settle("connect", Err(status))
            }
        }
    }

    /// Close every open object, then MQDISC and release the binding.
    pub(crate) fn disconnect(&mut self) -> crate::Result<Completion> {
        let Some(hconn) = self.hconn else {
            self.status = Status::OK;
            return Ok(Completion::Ok);
        };
        let Some(mut transport) = self.transport.take() else {
            self.hconn = None;
            return Ok(Completion::Ok);
        };

        for (_, object) in self.objects.drain() {
            if let Err(status) = transport.close(hconn, object.hobj, object.close_options) {
                warn!(
                    queue_manager = %self.name,
                    queue = %object.queue,
                    reason_code = status.reason_code,
                    "failed to close queue during disconnect"
                );
            }
        }

        let result = transport.disconnect(hconn);
        transport.release();
        self.hconn = None;
        self.in_unit_of_work = false;
        info!(queue_manager = %self.name, "disconnected from queue manager");
        self.settle("disconnect", result)
    }

    // -----------------------------------------------------------------------
    //  Units of work
    // -----------------------------------------------------------------------

    pub(crate) fn begin(&mut self) -> crate::Result<Completion> {
        let result = self.call("begin", |t, hconn| t.begin(hconn))?;
        // Without a transaction manager MQBEGIN warns that it is coordinating
        // MQ resources only; the unit of work is still started.
        let result = match result {
            Err(s) if s.comp_code == MQCC_WARNING && s.reason_code == MQRC_NO_EXTERNAL_PARTICIPANTS => Ok(()),
            other => other,
        };
        if result.is_ok() {
            self.in_unit_of_work = true;
        }
        self.settle("begin", result)
    }

    pub(crate) fn commit(&mut self) -> crate::Result<Completion> {
        self.finish_unit_of_work("commit")
    }

    pub(crate) fn backout(&mut self) -> crate::Result<Completion> {
        self.finish_unit_of_work("backout")
    }

    fn finish_unit_of_work(&mut self, operation: &'static str) -> crate::Result<Completion> {
        if !self.is_connected() {
            return Err(self.not_connected(operation));
        }
        if !self.in_unit_of_work {
            self.status = Status::OK;
            return Ok(Completion::Ok);
        }
        let result = self.call(operation, |t, hconn| match operation {
            "commit" => t.commit(hconn),
            _ => t.backout(hconn),
        })?;
        self.in_unit_of_work = false;
        self.settle(operation, result)
    }

    // -----------------------------------------------------------------------
    //  Objects
    // -----------------------------------------------------------------------

    /// MQOPEN; on success the handle is registered and its id returned.
    pub(crate) fn open_object(
        &mut self,
        od: &mut Mqod,
        options: i32,
        close_options: i32,
    ) -> crate::Result<Result<u64, Status>> {
        let opened = self.call("open", |t, hconn| t.open(hconn, od, options))?;
        Ok(opened.map(|hobj| {
            let id = self.next_object_id;
            self.next_object_id += 1;
            self.objects.insert(
                id,
                OpenObject {
                    hobj,
                    queue: od.object_name.clone(),
                    close_options,
                },
            );
            id
        }))
    }

    /// Handle for a registered object, `None` once closed or disconnected.
    pub(crate) fn object(&self, id: u64) -> Option<Hobj> {
        self.objects.get(&id).map(|o| o.hobj)
    }

    /// Unregister and MQCLOSE. The registration is gone even if the close
    /// fails.
    pub(crate) fn close_object(&mut self, id: u64) -> crate::Result<Result<(), Status>> {
        let Some(object) = self.objects.remove(&id) else {
            return Ok(Ok(()));
        };
        self.call("close", |t, hconn| t.close(hconn, object.hobj, object.close_options))
    }

    pub(crate) fn open_object_count(&self) -> usize {
        self.objects.len()
    }

    // -----------------------------------------------------------------------
    //  Manager-level calls
    // -----------------------------------------------------------------------

    pub(crate) fn put1(
        &mut self,
        od: &mut Mqod,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> crate::Result<Completion> {
        let result = self.call("put1", |t, hconn| t.put1(hconn, od, md, pmo, data))?;
        self.settle("put1", result)
    }

    /// mqExecute. Failures follow the manager's error policy; a suppressed
    /// failure yields no items.
    pub(crate) fn execute(&mut self, command: &Command) -> crate::Result<Vec<ResponseItem>> {
        match self.call("execute", |t, hconn| t.execute(hconn, command))? {
            Ok(items) => {
                self.status = Status::OK;
                Ok(items)
            }
            Err(status) => {
                self.status = status;
                on_failure("execute", status, self.options.exception_on_error)?;
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::transport::InMemoryProvider;

    fn connection(provider: &InMemoryProvider) -> Connection {
        Connection::new(ConnectOptions::local("QM1"), Arc::new(provider.clone()))
    }

    #[test]
    fn test_call_requires_connection() {
        let provider = InMemoryProvider::new("QM1");
        let mut conn = connection(&provider);
        let err = conn.call("begin", |t, hconn| t.begin(hconn)).unwrap_err();
        assert!(matches!(err, MqError::NotConnected { operation: "begin", .. }));
    }

    #[test]
    fn test_connect_twice() {
        let provider = InMemoryProvider::new("QM1");
        let mut conn = connection(&provider);
        assert_eq!(conn.connect().unwrap(), Completion::Ok);
        assert!(matches!(conn.connect(), Err(MqError::AlreadyConnected { .. })));
        assert_eq!(provider.connection_count(), 1);
    }

    #[test]
    fn test_failed_connect_without_raising() {
        let provider = InMemoryProvider::new("QM1");
        let options = ConnectOptions {
            exception_on_error: false,
            ..ConnectOptions::local("QM2")
        };
        let mut conn = Connection::new(options, Arc::new(provider));
        let completion = conn.connect().unwrap();
        assert_eq!(completion.status().map(|s| s.reason_code), Some(MQRC_Q_MGR_NAME_ERROR));
        assert!(!conn.is_connected());
        assert_eq!(conn.status().reason_code, MQRC_Q_MGR_NAME_ERROR);
    }

    #[test]
    fn test_disconnect_closes_registered_objects() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("TEST.Q");
        let mut conn = connection(&provider);
        assert!(conn.connect().unwrap().is_ok());

        let mut od = Mqod {
            object_name: "TEST.Q".into(),
            ..Default::default()
        };
        let id = conn.open_object(&mut od, MQOO_OUTPUT, MQCO_NONE).unwrap().unwrap();
        assert!(conn.object(id).is_some());
        assert_eq!(provider.open_handles(), 1);

        assert!(conn.disconnect().unwrap().is_ok());
        assert!(conn.object(id).is_none());
        assert_eq!(provider.open_handles(), 0);
        assert_eq!(conn.disconnect().unwrap(), Completion::Ok);
    }

    #[test]
    fn test_commit_without_unit_of_work_is_noop() {
        let provider = InMemoryProvider::new("QM1");
        let mut conn = connection(&provider);
        assert!(matches!(conn.commit(), Err(MqError::NotConnected { .. })));
        assert!(conn.connect().unwrap().is_ok());
        assert_eq!(conn.commit().unwrap(), Completion::Ok);
        assert_eq!(conn.begin().unwrap(), Completion::Ok);
        assert!(conn.in_unit_of_work());
        assert_eq!(conn.backout().unwrap(), Completion::Ok);
        assert!(!conn.in_unit_of_work());
    }
}
