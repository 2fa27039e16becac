//! Queues opened against a queue manager connection.
//!
//! A [`Queue`] holds a registry id into the shared connection, never a raw
//! object handle. Closing the queue, disconnecting the manager or dropping
//! either one invalidates it; later calls fail with
//! [`MqError::QueueNotOpen`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::*;
use crate::error::{Completion, MqError, Status};
use crate::message::Message;
use crate::mqi::{lock, on_failure, Connection, SharedConnection};
use crate::queue_manager::QueueManager;
use crate::structures::{MqPmo, Mqgmo, Mqmd, Mqod};
use crate::transport::Hobj;

/// Receive buffer used when [`GetOptions::buffer_size`] is not set.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

// ---------------------------------------------------------------------------
//  Open options
// ---------------------------------------------------------------------------

/// How a queue is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Input as the queue definition says.
    Input,
    InputShared,
    InputExclusive,
    Output,
    Browse,
}

impl OpenMode {
    /// MQOO_* flag for the mode.
    pub fn flag(self) -> i32 {
        match self {
            Self::Input => MQOO_INPUT_AS_Q_DEF,
            Self::InputShared => MQOO_INPUT_SHARED,
            Self::InputExclusive => MQOO_INPUT_EXCLUSIVE,
            Self::Output => MQOO_OUTPUT,
            Self::Browse => MQOO_BROWSE,
        }
    }
}

/// What to open and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    pub q_name: String,
    /// Remote queue manager; blank for the connected one.
    pub q_mgr_name: String,
    pub mode: Option<OpenMode>,
    /// Raw MQOO_* bits, combined with `mode`.
    pub open_options: i32,
    /// MQCO_* bits used on close.
    pub close_options: i32,
    pub fail_if_quiescing: bool,
    /// With `false`, a model-queue open that reports an existing dynamic
    /// queue reopens `dynamic_q_name` instead.
    pub fail_if_exists: bool,
    /// Template for queues created from a model queue.
    pub dynamic_q_name: Option<String>,
    pub alternate_user_id: Option<String>,
    pub alternate_security_id: Option<Vec<u8>>,
}

impl QueueOptions {
    pub fn new(q_name: impl Into<String>) -> Self {
        Self {
            q_name: q_name.into(),
            q_mgr_name: String::new(),
            mode: None,
            open_options: 0,
            close_options: MQCO_NONE,
            fail_if_quiescing: true,
            fail_if_exists: true,
            dynamic_q_name: None,
            alternate_user_id: None,
            alternate_security_id: None,
        }
    }

    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Qualify the queue with a remote queue manager.
    pub fn on(mut self, q_mgr_name: impl Into<String>) -> Self {
        self.q_mgr_name = q_mgr_name.into();
        self
    }

    pub fn open_options(mut self, options: i32) -> Self {
        self.open_options = options;
        self
    }

    pub fn close_options(mut self, options: i32) -> Self {
        self.close_options = options;
        self
    }

    pub fn dynamic_q_name(mut self, name: impl Into<String>) -> Self {
        self.dynamic_q_name = Some(name.into());
        self
    }

    pub fn fail_if_exists(mut self, fail: bool) -> Self {
        self.fail_if_exists = fail;
        self
    }

    pub fn fail_if_quiescing(mut self, fail: bool) -> Self {
        self.fail_if_quiescing = fail;
        self
    }

    pub fn alternate_user_id(mut self, user: impl Into<String>) -> Self {
        self.alternate_user_id = Some(user.into());
        self
    }

    /// The MQOO_* value passed to MQOPEN.
    pub fn effective_open_options(&self) -> crate::Result<i32> {
        let mut options = self.open_options;
        match self.mode {
            Some(mode) => options |= mode.flag(),
            None if options == 0 => {
                return Err(MqError::InvalidOptions {
                    operation: "open",
                    reason: "either a mode or explicit open options are required".into(),
                })
            }
            None => {}
        }
        if self.fail_if_quiescing {
            options |= MQOO_FAIL_IF_QUIESCING;
        }
        if self.alternate_user_id.is_some() {
            options |= MQOO_ALTERNATE_USER_AUTHORITY;
        }
        Ok(options)
    }

    fn descriptor(&self, object_name: &str) -> Mqod {
        let mut od = Mqod {
            object_name: object_name.to_string(),
            object_qmgr_name: self.q_mgr_name.clone(),
            alternate_user_id: self.alternate_user_id.clone().unwrap_or_default(),
            alternate_security_id: self.alternate_security_id.clone().unwrap_or_default(),
            ..Default::default()
        };
        if let Some(dynamic) = &self.dynamic_q_name {
            od.dynamic_q_name = dynamic.clone();
        }
        od
    }
}

// ---------------------------------------------------------------------------
//  Put / get options
// ---------------------------------------------------------------------------

/// Options for a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    /// Put under syncpoint.
    pub sync: bool,
    /// Generate a new msg_id and correl_id. Without it a msg_id is only
    /// generated when the descriptor has none.
    pub new_id: bool,
    pub fail_if_quiescing: bool,
    /// Raw MQPMO_* bits.
    pub options: i32,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            sync: false,
            new_id: false,
            fail_if_quiescing: true,
            options: MQPMO_NONE,
        }
    }
}

impl PutOptions {
    pub fn sync() -> Self {
        Self {
            sync: true,
            ..Default::default()
        }
    }

    pub(crate) fn to_pmo(&self, md: &Mqmd) -> MqPmo {
        let mut options = self.options;
        options |= if self.sync { MQPMO_SYNCPOINT } else { MQPMO_NO_SYNCPOINT };
        if self.fail_if_quiescing {
            options |= MQPMO_FAIL_IF_QUIESCING;
        }
        if self.new_id {
            options |= MQPMO_NEW_MSG_ID | MQPMO_NEW_CORREL_ID;
        } else if md.msg_id == [0u8; 24] {
            options |= MQPMO_NEW_MSG_ID;
        }
        MqPmo {
            options,
            ..Default::default()
        }
    }
}

/// How long a get waits for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wait {
    #[default]
    NoWait,
    Unlimited,
    Millis(u32),
}

/// Browse cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browse {
    First,
    Next,
}

/// Options for a get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOptions {
    pub wait: Wait,
    /// Get under syncpoint.
    pub sync: bool,
    /// Ask the queue manager to convert the data to the descriptor's
    /// encoding and CCSID.
    pub convert: bool,
    pub browse: Option<Browse>,
    /// Only return a message whose msg_id equals the descriptor's.
    pub match_msg_id: bool,
    /// Only return a message whose correl_id equals the descriptor's.
    pub match_correl_id: bool,
    pub accept_truncated: bool,
    /// Initial receive buffer; grown once if the message is larger.
    pub buffer_size: usize,
    pub fail_if_quiescing: bool,
    /// Raw MQGMO_* bits.
    pub options: i32,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            wait: Wait::NoWait,
            sync: false,
            convert: false,
            browse: None,
            match_msg_id: false,
            match_correl_id: false,
            accept_truncated: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            fail_if_quiescing: true,
            options: MQGMO_NO_WAIT,
        }
    }
}

impl GetOptions {
    pub fn wait(wait: Wait) -> Self {
        Self {
            wait,
            ..Default::default()
        }
    }

    pub(crate) fn to_gmo(&self) -> Mqgmo {
        let mut options = self.options;
        let wait_interval = match self.wait {
            Wait::NoWait => 0,
            Wait::Unlimited => {
                options |= MQGMO_WAIT;
                MQWI_UNLIMITED
            }
            Wait::Millis(ms) => {
                options |= MQGMO_WAIT;
                i32::try_from(ms).unwrap_or(i32::MAX)
            }
        };
        match self.browse {
            Some(Browse::First) => options |= MQGMO_BROWSE_FIRST,
            Some(Browse::Next) => options |= MQGMO_BROWSE_NEXT,
            None if self.sync => options |= MQGMO_SYNCPOINT,
            None => options |= MQGMO_NO_SYNCPOINT,
        }
        if self.convert {
            options |= MQGMO_CONVERT;
        }
        if self.accept_truncated {
            options |= MQGMO_ACCEPT_TRUNCATED_MSG;
        }
        if self.fail_if_quiescing {
            options |= MQGMO_FAIL_IF_QUIESCING;
        }
        let mut match_options = MQMO_NONE;
        if self.match_msg_id {
            match_options |= MQMO_MATCH_MSG_ID;
        }
        if self.match_correl_id {
            match_options |= MQMO_MATCH_CORREL_ID;
        }
        Mqgmo {
            options,
            wait_interval,
            match_options,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
//  Queue
// ---------------------------------------------------------------------------

/// A queue bound to a [`QueueManager`] connection.
///
/// All calls on queues of one manager are serialised through the shared
/// connection. Sharing one queue between threads still needs the caller's
/// own synchronisation, as does interleaving units of work.
#[derive(Debug)]
pub struct Queue {
    connection: SharedConnection,
    options: QueueOptions,
    name: String,
    object: Option<u64>,
    open_options: i32,
    status: Status,
}

impl Queue {
    pub(crate) fn new(connection: SharedConnection, options: QueueOptions) -> Self {
        Self {
            name: options.q_name.clone(),
            connection,
            options,
            object: None,
            open_options: 0,
            status: Status::OK,
        }
    }

    /// Open the queue on `manager`, run `f`, then close it.
    ///
    /// A failed open is raised even when the manager suppresses transport
    /// errors, since `f` has nothing to work with.
    pub fn open_with<T>(
        manager: &QueueManager,
        options: QueueOptions,
        f: impl FnOnce(&mut Queue) -> crate::Result<T>,
    ) -> crate::Result<T> {
        let mut queue = manager.queue(options);
        if let Completion::Failed(status) = queue.open()? {
            return Err(MqError::transport("open", status));
        }
        let result = f(&mut queue);
        let closed = queue.close();
        let value = result?;
        closed.map(|_| value)
    }

    fn handle(&self, conn: &Connection, operation: &'static str) -> crate::Result<Hobj> {
        self.object
            .and_then(|id| conn.object(id))
            .ok_or_else(|| MqError::QueueNotOpen {
                operation,
                queue: self.name.clone(),
            })
    }

    fn settle(
        &mut self,
        conn: &Connection,
        operation: &'static str,
        result: Result<(), Status>,
    ) -> crate::Result<Completion> {
        match result {
            Ok(()) => {
                self.status = Status::OK;
                Ok(Completion::Ok)
            }
            Err(status) => {
                self.status = status;
                on_failure(operation, status, conn.exception_on_error())
            }
        }
    }

    /// MQOPEN.
    pub fn open(&mut self) -> crate::Result<Completion> {
        let connection = Arc::clone(&self.connection);
        let mut conn = lock(&connection);
        if !conn.is_connected() {
            return Err(MqError::NotConnected {
                operation: "open",
                queue_manager: conn.name().to_string(),
            });
        }
        if self.object.and_then(|id| conn.object(id)).is_some() {
            return Err(MqError::QueueAlreadyOpen {
                queue: self.name.clone(),
            });
        }
        self.object = None;

        let options = self.options.effective_open_options()?;
        let close_options = self.options.close_options;
        let mut od = self.options.descriptor(&self.options.q_name);
        let mut opened = conn.open_object(&mut od, options, close_options)?;
        if let (Err(status), false, Some(dynamic)) =
            (&opened, self.options.fail_if_exists, &self.options.dynamic_q_name)
        {
            if status.reason_code == MQRC_OBJECT_ALREADY_EXISTS {
                od = self.options.descriptor(dynamic);
                opened = conn.open_object(&mut od, options, close_options)?;
            }
        }

        match opened {
            Ok(id) => {
                self.object = Some(id);
                self.open_options = options;
                self.name = od.object_name;
                if conn.options().trace_level >= 1 {
                    debug!(queue_manager = %conn.name(), queue = %self.name, options, "opened queue");
                }
                self.settle(&conn, "open", Ok(()))
            }
            Err(status) => self.settle(&conn, "open", Err(status)),
        }
    }

    /// MQCLOSE. A no-op when the queue is not open; the handle is dropped
    /// even if the close fails.
    pub fn close(&mut self) -> crate::Result<Completion> {
        let Some(id) = self.object.take() else {
            return Ok(Completion::Ok);
        };
        let connection = Arc::clone(&self.connection);
        let mut conn = lock(&connection);
        if conn.object(id).is_none() {
            self.status = Status::OK;
            return Ok(Completion::Ok);
        }
        let result = conn.close_object(id)?;
        self.settle(&conn, "close", result)
    }

    /// MQPUT. The descriptor returned by the queue manager, with the
    /// generated msg_id, is written back into `message`.
    pub fn put(&mut self, message: &mut Message, options: &PutOptions) -> crate::Result<Completion> {
        let connection = Arc::clone(&self.connection);
        let mut conn = lock(&connection);
        let hobj = self.handle(&conn, "put")?;

        let (mut md, body) = message.to_wire();
        let mut pmo = options.to_pmo(&md);
        let result = conn.call("put", |t, hconn| t.put(hconn, hobj, &mut md, &mut pmo, &body))?;
        drop(body);
        if result.is_ok() {
            message.accept_put_descriptor(md);
            if options.sync {
                conn.join_unit_of_work();
            }
        }
        self.settle(&conn, "put", result)
    }

    /// MQGET into `message`.
    ///
    /// The message's msg_id and correl_id are the match values when the
    /// match options are set. A buffer too small for the message is grown to
    /// the reported length and the get retried once. An empty queue yields
    /// [`Completion::NoMessage`] whatever the error policy.
    pub fn get(&mut self, message: &mut Message, options: &GetOptions) -> crate::Result<Completion> {
        let connection = Arc::clone(&self.connection);
        let mut conn = lock(&connection);
        let hobj = self.handle(&conn, "get")?;

        let request = message.descriptor.clone();
        let mut md = request.clone();
        let mut gmo = options.to_gmo();
        let mut buffer = std::mem::take(&mut message.data);
        buffer.clear();
        buffer.resize(options.buffer_size, 0);
        let mut length = 0;

        let mut result = conn.call("get", |t, hconn| {
            t.get(hconn, hobj, &mut md, &mut gmo, &mut buffer, &mut length)
        })?;
        if matches!(result, Err(s) if s.reason_code == MQRC_TRUNCATED_MSG_FAILED) && length > buffer.len() {
            debug!(queue = %self.name, length, "growing receive buffer");
            buffer.resize(length, 0);
            md = request;
            result = conn.call("get", |t, hconn| {
                t.get(hconn, hobj, &mut md, &mut gmo, &mut buffer, &mut length)
            })?;
        }

        let delivered = match result {
            Ok(()) => true,
            Err(s) => s.comp_code == MQCC_WARNING,
        };
        if delivered {
            buffer.truncate(length.min(buffer.len()));
            message.data = buffer;
            message.descriptor = md;
            message.take_headers();
            if options.sync && options.browse.is_none() {
                conn.join_unit_of_work();
            }
        } else {
            buffer.clear();
            message.data = buffer;
        }

        match result {
            Err(status) if status.reason_code == MQRC_NO_MSG_AVAILABLE => {
                self.status = status;
                Ok(Completion::NoMessage)
            }
            other => self.settle(&conn, "get", other),
        }
    }

    /// Iterate over messages until the queue is empty.
    ///
    /// Every step is a fresh get against the current queue state. On a queue
    /// opened for browsing the first step browses first and the rest
    /// browse next. A raised error is yielded once and ends the iteration.
    pub fn each(&mut self, options: GetOptions) -> Messages<'_> {
        let browse = options.browse.is_some() || self.open_options & MQOO_BROWSE != 0;
        Messages {
            queue: self,
            options,
            browse,
            started: false,
            done: false,
        }
    }

    /// MQINQ for integer attributes. A suppressed failure returns no values.
    pub fn inquire(&mut self, selectors: &[i32]) -> crate::Result<Vec<i32>> {
        let connection = Arc::clone(&self.connection);
        let mut conn = lock(&connection);
        let hobj = self.handle(&conn, "inquire")?;
        match conn.call("inquire", |t, hconn| t.inquire(hconn, hobj, selectors))? {
            Ok(values) => {
                self.status = Status::OK;
                Ok(values)
            }
            Err(status) => {
                self.settle(&conn, "inquire", Err(status))?;
                Ok(Vec::new())
            }
        }
    }

    /// MQSET for integer attributes.
    pub fn set(&mut self, attributes: &[(i32, i32)]) -> crate::Result<Completion> {
        let connection = Arc::clone(&self.connection);
        let mut conn = lock(&connection);
        let hobj = self.handle(&conn, "set")?;
        let result = conn.call("set", |t, hconn| t.set(hconn, hobj, attributes))?;
        self.settle(&conn, "set", result)
    }

    /// Queue name; after opening a model queue, the dynamic queue's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.object
            .is_some_and(|id| lock(&self.connection).object(id).is_some())
    }

    pub fn comp_code(&self) -> i32 {
        self.status.comp_code
    }

    pub fn reason_code(&self) -> i32 {
        self.status.reason_code
    }

    /// Symbolic name of the last reason code.
    pub fn reason(&self) -> &'static str {
        self.status.reason()
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        if self.object.is_none() {
            return;
        }
        if let Err(e) = self.close() {
            warn!(queue = %self.name, error = %e, "failed to close queue on drop");
        }
    }
}

/// Iterator returned by [`Queue::each`].
#[derive(Debug)]
pub struct Messages<'q> {
    queue: &'q mut Queue,
    options: GetOptions,
    browse: bool,
    started: bool,
    done: bool,
}

impl Iterator for Messages<'_> {
    type Item = crate::Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.browse {
            self.options.browse = Some(if self.started { Browse::Next } else { Browse::First });
        }
        let mut message = Message::default();
        match self.queue.get(&mut message, &self.options) {
            Ok(Completion::Ok) => {
                self.started = true;
                Some(Ok(message))
            }
            // A warning still filled in the message.
            Ok(Completion::Failed(status)) if status.comp_code == MQCC_WARNING => {
                self.started = true;
                Some(Ok(message))
            }
            Ok(Completion::NoMessage | Completion::Failed(_)) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
