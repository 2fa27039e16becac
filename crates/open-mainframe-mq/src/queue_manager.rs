//! Queue manager connections.
//!
//! A [`QueueManager`] owns one MQI connection. Queues opened from it share
//! that connection and are invalidated when it disconnects.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::warn;

use crate::admin::{BagValue, Command, CommandCode, ResponseItem, Selector};
use crate::config::ConnectOptions;
use crate::constants::*;
use crate::error::{Completion, MqError, Status};
use crate::message::{Header, Message};
use crate::mqi::{lock, Connection, SharedConnection};
use crate::queue::{PutOptions, Queue, QueueOptions};
use crate::structures::{MqMsgType, Mqdlh, Mqod};
use crate::transport::{default_provider, TransportProvider};

/// Target of a one-shot put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub q_name: String,
    pub q_mgr_name: String,
    pub options: PutOptions,
}

impl PutRequest {
    pub fn new(q_name: impl Into<String>) -> Self {
        Self {
            q_name: q_name.into(),
            q_mgr_name: String::new(),
            options: PutOptions::default(),
        }
    }

    /// Route through a remote queue manager.
    pub fn on(mut self, q_mgr_name: impl Into<String>) -> Self {
        self.q_mgr_name = q_mgr_name.into();
        self
    }

    pub fn options(mut self, options: PutOptions) -> Self {
        self.options = options;
        self
    }
}

/// A connection to one queue manager.
///
/// Every call made through the manager or its queues goes through one
/// shared connection and is serialised. Units of work are per connection:
/// threads interleaving `begin`/`commit` on the same manager must
/// coordinate themselves.
///
/// ```no_run
/// use open_mainframe_mq::{ConnectOptions, Message, OpenMode, PutOptions, QueueManager, QueueOptions};
///
/// # fn main() -> open_mainframe_mq::Result<()> {
/// QueueManager::session(ConnectOptions::local("QM1"), |qmgr| {
///     let mut queue = qmgr.open_queue(QueueOptions::new("TEST.Q").mode(OpenMode::Output))?;
///     let mut message = Message::new("hello");
///     let completion = queue.put(&mut message, &PutOptions::default())?;
///     assert!(completion.is_ok());
///     Ok(())
/// })
/// # }
/// ```
#[derive(Debug)]
pub struct QueueManager {
    connection: SharedConnection,
}

impl QueueManager {
    /// An unconnected manager bound through the installed MQ library.
    pub fn new(options: ConnectOptions) -> Self {
        Self::with_provider(options, default_provider())
    }

    /// An unconnected manager using `provider` for its transport.
    pub fn with_provider(options: ConnectOptions, provider: Arc<dyn TransportProvider>) -> Self {
        Self {
            connection: Arc::new(Mutex::new(Connection::new(options, provider))),
        }
    }

    /// Construct and connect. A failed connect is raised whatever the error
    /// policy.
    pub fn connect_with(options: ConnectOptions) -> crate::Result<Self> {
        let mut manager = Self::new(options);
        if let Completion::Failed(status) = manager.connect()? {
            return Err(MqError::transport("connect", status));
        }
        Ok(manager)
    }

    /// Connect, run `f`, then back out anything uncommitted and disconnect,
    /// whether or not `f` succeeded.
    pub fn session<T>(
        options: ConnectOptions,
        f: impl FnOnce(&mut QueueManager) -> crate::Result<T>,
    ) -> crate::Result<T> {
        Self::new(options).scoped(f)
    }

    /// [`session`](Self::session) for a manager that is already built.
    pub fn scoped<T>(mut self, f: impl FnOnce(&mut QueueManager) -> crate::Result<T>) -> crate::Result<T> {
        if let Completion::Failed(status) = self.connect()? {
            return Err(MqError::transport("connect", status));
        }
        let result = f(&mut self);
        if let Err(e) = self.backout() {
            warn!(queue_manager = %self.name(), error = %e, "backout at end of session failed");
        }
        let disconnected = self.disconnect();
        let value = result?;
        disconnected.map(|_| value)
    }

    // -----------------------------------------------------------------------
    //  Connection lifecycle
    // -----------------------------------------------------------------------

    /// MQCONNX, loading the transport first.
    pub fn connect(&mut self) -> crate::Result<Completion> {
        lock(&self.connection).connect()
    }

    /// Close every open queue, MQDISC, and release the transport.
    pub fn disconnect(&mut self) -> crate::Result<Completion> {
        lock(&self.connection).disconnect()
    }

    pub fn begin(&mut self) -> crate::Result<Completion> {
        lock(&self.connection).begin()
    }

    pub fn commit(&mut self) -> crate::Result<Completion> {
        lock(&self.connection).commit()
    }

    pub fn backout(&mut self) -> crate::Result<Completion> {
        lock(&self.connection).backout()
    }

    // -----------------------------------------------------------------------
    //  Messaging
    // -----------------------------------------------------------------------

    /// MQPUT1 to a queue that is not open.
    pub fn put(&mut self, request: &PutRequest, message: &mut Message) -> crate::Result<Completion> {
        let mut conn = lock(&self.connection);
        let mut od = Mqod {
            object_name: request.q_name.clone(),
            object_qmgr_name: request.q_mgr_name.clone(),
            ..Default::default()
        };
        let (mut md, body) = message.to_wire();
        let mut pmo = request.options.to_pmo(&md);
        let completion = conn.put1(&mut od, &mut md, &mut pmo, &body)?;
        drop(body);
        if completion.is_ok() {
            message.accept_put_descriptor(md);
            if request.options.sync {
                conn.join_unit_of_work();
            }
        }
        Ok(completion)
    }

    /// Reply to a request message. Returns `None` without putting anything
    /// when `request` is not of type REQUEST.
    pub fn put_to_reply_q(
        &mut self,
        request: &Message,
        reply: &mut Message,
        options: PutOptions,
    ) -> crate::Result<Option<Completion>> {
        let asked = &request.descriptor;
        if asked.msg_type != MqMsgType::Request {
            return Ok(None);
        }

        let md = &mut reply.descriptor;
        md.msg_type = MqMsgType::Reply;
        md.expiry = asked.expiry;
        md.priority = asked.priority;
        md.persistence = asked.persistence;
        md.format = asked.format.clone();
        md.correl_id = if asked.report & MQRO_PASS_CORREL_ID != 0 {
            asked.correl_id
        } else {
            asked.msg_id
        };
        if asked.report & MQRO_PASS_MSG_ID != 0 {
            md.msg_id = asked.msg_id;
        }

        let target = PutRequest::new(asked.reply_to_q.clone())
            .on(asked.reply_to_q_mgr.clone())
            .options(options);
        self.put(&target, reply).map(Some)
    }

    /// Prefix a dead-letter header recording `reason` and the intended
    /// destination `q_name`, then put to the system dead-letter queue.
    pub fn put_to_dead_letter_q(
        &mut self,
        message: &mut Message,
        reason: i32,
        q_name: &str,
        options: PutOptions,
    ) -> crate::Result<Completion> {
        let now = Utc::now();
        let dlh = Mqdlh {
            reason,
            dest_q_name: q_name.to_string(),
            dest_qmgr_name: self.name(),
            put_date: now.format("%Y%m%d").to_string(),
            put_time: format!("{}{:02}", now.format("%H%M%S"), now.timestamp_subsec_millis() / 10),
            ..Default::default()
        };
        message.headers.insert(0, Header::DeadLetter(dlh));
        let target = PutRequest::new(SYSTEM_DEAD_LETTER_QUEUE).options(options);
        self.put(&target, message)
    }

    // -----------------------------------------------------------------------
    //  Queues
    // -----------------------------------------------------------------------

    /// A queue bound to this manager, not yet opened.
    pub fn queue(&self, options: QueueOptions) -> Queue {
        Queue::new(Arc::clone(&self.connection), options)
    }

    /// Build and open a queue. A failed open is raised whatever the error
    /// policy.
    pub fn open_queue(&self, options: QueueOptions) -> crate::Result<Queue> {
        let mut queue = self.queue(options);
        if let Completion::Failed(status) = queue.open()? {
            return Err(MqError::transport("open", status));
        }
        Ok(queue)
    }

    /// Number of queues currently open on this connection.
    pub fn open_queue_count(&self) -> usize {
        lock(&self.connection).open_object_count()
    }

    // -----------------------------------------------------------------------
    //  Administration
    // -----------------------------------------------------------------------

    /// Run a PCF command through mqExecute.
    pub fn execute(&mut self, command: &Command) -> crate::Result<Vec<ResponseItem>> {
        lock(&self.connection).execute(command)
    }

    /// Run MQSC text through the command server. Returns the reply lines.
    pub fn mqsc(&mut self, text: &str) -> crate::Result<Vec<String>> {
        let command = Command::new(CommandCode::Escape)
            .with(Selector::ESCAPE_TYPE, MQET_MQSC)
            .with(Selector::ESCAPE_TEXT, text);
        let replies = self.execute(&command)?;
        Ok(replies
            .iter()
            .filter_map(|item| item.get(&Selector::ESCAPE_TEXT).and_then(BagValue::as_str))
            .map(str::to_string)
            .collect())
    }

    // -----------------------------------------------------------------------
    //  State
    // -----------------------------------------------------------------------

    pub fn name(&self) -> String {
        lock(&self.connection).name().to_string()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.connection).is_connected()
    }

    pub fn in_unit_of_work(&self) -> bool {
        lock(&self.connection).in_unit_of_work()
    }

    pub fn exception_on_error(&self) -> bool {
        lock(&self.connection).exception_on_error()
    }

    pub fn status(&self) -> Status {
        lock(&self.connection).status()
    }

    pub fn comp_code(&self) -> i32 {
        self.status().comp_code
    }

    pub fn reason_code(&self) -> i32 {
        self.status().reason_code
    }

    /// Symbolic name of the last reason code.
    pub fn reason(&self) -> &'static str {
        self.status().reason()
    }

    /// Options the manager was built with.
    pub fn options(&self) -> ConnectOptions {
        lock(&self.connection).options().clone()
    }
}

impl Drop for QueueManager {
    fn drop(&mut self) {
        let mut conn = lock(&self.connection);
        if !conn.is_connected() {
            return;
        }
        if let Err(e) = conn.disconnect() {
            warn!(queue_manager = %conn.name(), error = %e, "failed to disconnect on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{GetOptions, OpenMode};
    use crate::transport::InMemoryProvider;

    fn manager(provider: &InMemoryProvider) -> QueueManager {
        QueueManager::with_provider(ConnectOptions::local("QM1"), Arc::new(provider.clone()))
    }

    fn read_one(qmgr: &QueueManager, q_name: &str) -> Message {
        let mut queue = qmgr
            .open_queue(QueueOptions::new(q_name).mode(OpenMode::Input))
            .unwrap();
        let mut message = Message::default();
        assert_eq!(queue.get(&mut message, &GetOptions::default()).unwrap(), Completion::Ok);
        message
    }

    #[test]
    fn test_put1_without_open() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("TEST.Q");
        let mut qmgr = manager(&provider);
        assert!(qmgr.connect().unwrap().is_ok());

        let mut message = Message::new("one-shot");
        let completion = qmgr.put(&PutRequest::new("TEST.Q"), &mut message).unwrap();
        assert_eq!(completion, Completion::Ok);
        assert_ne!(message.descriptor.msg_id, [0u8; 24]);
        assert_eq!(provider.depth("TEST.Q"), Some(1));
        assert_eq!(qmgr.open_queue_count(), 0);
    }

    #[test]
    fn test_put1_requires_connection() {
        let provider = InMemoryProvider::new("QM1");
        let mut qmgr = manager(&provider);
        let err = qmgr.put(&PutRequest::new("TEST.Q"), &mut Message::new("x")).unwrap_err();
        assert!(err.is_state_error());
    }

    #[test]
    fn test_reply_correlates_on_request_msg_id() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("REPLY.Q");
        let mut qmgr = manager(&provider);
        assert!(qmgr.connect().unwrap().is_ok());

        let mut request = Message::new("ping");
        request.descriptor.msg_type = MqMsgType::Request;
        request.descriptor.msg_id = [4u8; 24];
        request.descriptor.correl_id = [9u8; 24];
        request.descriptor.reply_to_q = "REPLY.Q".into();
        request.descriptor.format = MQFMT_STRING.into();

        let mut reply = Message::new("pong");
        let completion = qmgr
            .put_to_reply_q(&request, &mut reply, PutOptions::default())
            .unwrap();
        assert_eq!(completion, Some(Completion::Ok));

        let received = read_one(&qmgr, "REPLY.Q");
        assert_eq!(received.descriptor.msg_type, MqMsgType::Reply);
        assert_eq!(received.descriptor.correl_id, [4u8; 24]);
        assert_eq!(received.descriptor.format, MQFMT_STRING);
        assert_eq!(received.text(), Some("pong"));
    }

    #[test]
    fn test_reply_passes_ids_when_asked() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("REPLY.Q");
        let mut qmgr = manager(&provider);
        assert!(qmgr.connect().unwrap().is_ok());

        let mut request = Message::new("ping");
        request.descriptor.msg_type = MqMsgType::Request;
        request.descriptor.report = MQRO_PASS_CORREL_ID | MQRO_PASS_MSG_ID;
        request.descriptor.msg_id = [4u8; 24];
        request.descriptor.correl_id = [9u8; 24];
        request.descriptor.reply_to_q = "REPLY.Q".into();

        let mut reply = Message::new("pong");
        qmgr.put_to_reply_q(&request, &mut reply, PutOptions::default())
            .unwrap();
        let received = read_one(&qmgr, "REPLY.Q");
        assert_eq!(received.descriptor.correl_id, [9u8; 24]);
        assert_eq!(received.descriptor.msg_id, [4u8; 24]);
    }

    #[test]
    fn test_no_reply_to_datagram() {
        let provider = InMemoryProvider::new("QM1");
        let mut qmgr = manager(&provider);
        assert!(qmgr.connect().unwrap().is_ok());
        let request = Message::new("fire and forget");
        let mut reply = Message::new("unused");
        assert_eq!(
            qmgr.put_to_reply_q(&request, &mut reply, PutOptions::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_dead_letter_put() {
        let provider = InMemoryProvider::new("QM1");
        let mut qmgr = manager(&provider);
        assert!(qmgr.connect().unwrap().is_ok());

        let mut message = Message::new("undeliverable");
        message.descriptor.format = MQFMT_STRING.into();
        let completion = qmgr
            .put_to_dead_letter_q(&mut message, MQRC_UNKNOWN_OBJECT_NAME, "MISSING.Q", PutOptions::default())
            .unwrap();
        assert_eq!(completion, Completion::Ok);

        let received = read_one(&qmgr, SYSTEM_DEAD_LETTER_QUEUE);
        assert_eq!(received.text(), Some("undeliverable"));
        assert_eq!(received.descriptor.format, MQFMT_STRING);
        let [Header::DeadLetter(dlh)] = received.headers.as_slice() else {
            panic!("expected one dead letter header, got {:?}", received.headers);
        };
        assert_eq!(dlh.reason, MQRC_UNKNOWN_OBJECT_NAME);
        assert_eq!(dlh.dest_q_name, "MISSING.Q");
        assert_eq!(dlh.dest_qmgr_name, "QM1");
        assert_eq!(dlh.put_date.len(), 8);
    }

    #[test]
    fn test_mqsc_round_trip() {
        let provider = InMemoryProvider::new("QM1");
        let mut qmgr = manager(&provider);
        assert!(qmgr.connect().unwrap().is_ok());

        let replies = qmgr.mqsc("DEFINE QLOCAL(ADMIN.Q)").unwrap();
        assert_eq!(replies, vec!["AMQ8006I: Queue created.".to_string()]);
        assert!(provider.queue_exists("ADMIN.Q"));
    }

    #[test]
    fn test_open_queue_requires_connection() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("TEST.Q");
        let qmgr = manager(&provider);
        let err = qmgr
            .open_queue(QueueOptions::new("TEST.Q").mode(OpenMode::Output))
            .unwrap_err();
        assert!(matches!(err, MqError::NotConnected { operation: "open", .. }));
    }

    #[test]
    fn test_scoped_session_backs_out_and_disconnects() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("TEST.Q");
        let result: crate::Result<()> = manager(&provider).scoped(|qmgr| {
            assert!(qmgr.begin().unwrap().is_ok());
            let request = PutRequest::new("TEST.Q").options(PutOptions::sync());
            assert!(qmgr.put(&request, &mut Message::new("pending")).unwrap().is_ok());
            assert!(qmgr.in_unit_of_work());
            Err(MqError::Config {
                message: "stop".into(),
            })
        });
        assert!(matches!(result, Err(MqError::Config { .. })));
        assert_eq!(provider.depth("TEST.Q"), Some(0));
        assert_eq!(provider.connection_count(), 0);
    }

    #[test]
    fn test_drop_disconnects() {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("TEST.Q");
        {
            let mut qmgr = manager(&provider);
            assert!(qmgr.connect().unwrap().is_ok());
            let _queue = qmgr.open_queue(QueueOptions::new("TEST.Q").mode(OpenMode::Output));
            assert_eq!(provider.open_handles(), 1);
        }
        assert_eq!(provider.open_handles(), 0);
        assert_eq!(provider.connection_count(), 0);
    }
}
