//! In-process queue manager.
//!
//! Queues, open handles and units of work live in one broker shared by every
//! connection made through the same [`InMemoryProvider`]. Connections behave
//! like separate applications attached to one queue manager: a message put
//! under syncpoint by one connection is invisible to all of them until it is
//! committed, and a blocked `get` wakes when another connection makes a
//! message available.
//!
//! Administration accepts the PCF queue commands and a small MQSC subset
//! (`DEFINE`, `ALTER`, `DELETE`, `CLEAR`, `DISPLAY` for queues, and
//! `PING QMGR`).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{Hconn, Hobj, Transport, TransportMode, TransportProvider};
use crate::admin::{BagValue, Command, CommandCode, ResponseItem, Selector};
use crate::config::ConnectOptions;
use crate::constants::*;
use crate::error::Status;
use crate::structures::{MqPersistence, MqPmo, MqPriority, Mqgmo, Mqmd, Mqod};

const DEFAULT_MAX_DEPTH: i32 = 5000;
const DEFAULT_MAX_MSG_LENGTH: i32 = 4_194_304;

/// Queues every in-memory queue manager starts with.
pub const DEAD_LETTER_QUEUE: &str = SYSTEM_DEAD_LETTER_QUEUE;
pub const DEFAULT_MODEL_QUEUE: &str = "SYSTEM.DEFAULT.MODEL.QUEUE";

// ---------------------------------------------------------------------------
//  Broker state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredMessage {
    seq: u64,
    md: Mqmd,
    data: Vec<u8>,
    /// Connection holding the message in an uncommitted put.
    owner: Option<i32>,
}

#[derive(Debug, Clone)]
struct LocalQueue {
    q_type: i32,
    description: String,
    max_depth: i32,
    max_msg_length: i32,
    inhibit_get: bool,
    inhibit_put: bool,
    def_persistence: i32,
    def_priority: i32,
    messages: VecDeque<StoredMessage>,
    open_handles: i32,
    open_input: i32,
    open_output: i32,
    exclusive: bool,
    /// Temporary dynamic queue.
    temporary: bool,
    /// Set once the creating handle has closed; the queue goes with the
    /// last open handle.
    pending_delete: bool,
}

impl LocalQueue {
    fn new(q_type: i32) -> Self {
        Self {
            q_type,
            description: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_msg_length: DEFAULT_MAX_MSG_LENGTH,
            inhibit_get: false,
            inhibit_put: false,
            def_persistence: MQPER_NOT_PERSISTENT,
            def_priority: 0,
            messages: VecDeque::new(),
            open_handles: 0,
            open_input: 0,
            open_output: 0,
            exclusive: false,
            temporary: false,
            pending_delete: false,
        }
    }

    /// A local queue created from this definition.
    fn instantiate(&self) -> Self {
        Self {
            q_type: MQQT_LOCAL,
            description: self.description.clone(),
            max_depth: self.max_depth,
            max_msg_length: self.max_msg_length,
            inhibit_get: self.inhibit_get,
            inhibit_put: self.inhibit_put,
            def_persistence: self.def_persistence,
            def_priority: self.def_priority,
            temporary: true,
            ..Self::new(MQQT_LOCAL)
        }
    }

    fn depth(&self) -> i32 {
        self.messages.len() as i32
    }
}

#[derive(Debug, Clone)]
struct OpenHandle {
    queue: String,
    options: i32,
    browse_cursor: Option<u64>,
    owns_queue: bool,
}

#[derive(Debug)]
enum UowEntry {
    Put { queue: String, seq: u64 },
    Get { queue: String, message: StoredMessage },
}

#[derive(Debug, Default)]
struct ConnState {
    handles: HashMap<i32, OpenHandle>,
    uow: Vec<UowEntry>,
}

/// Outcome of one non-blocking get attempt.
enum Fetch {
    Message { md: Mqmd, data: Vec<u8> },
    TooBig { md: Mqmd, length: usize },
    Empty,
}

#[derive(Debug)]
struct Broker {
    name: String,
    available: bool,
    queues: BTreeMap<String, LocalQueue>,
    connections: HashMap<i32, ConnState>,
    next_handle: i32,
    next_seq: u64,
    next_id: u64,
    next_dynamic: u64,
}

fn failed(reason_code: i32) -> Status {
    Status::failed(reason_code)
}

fn generic_match(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => pattern == name,
    }
}

impl Broker {
    fn new(name: &str) -> Self {
        let mut queues = BTreeMap::new();
        queues.insert(DEAD_LETTER_QUEUE.to_string(), LocalQueue::new(MQQT_LOCAL));
        queues.insert(DEFAULT_MODEL_QUEUE.to_string(), LocalQueue::new(MQQT_MODEL));
        Self {
            name: name.to_string(),
            available: true,
            queues,
            connections: HashMap::new(),
            next_handle: 1,
            next_seq: 1,
            next_id: 1,
            next_dynamic: 1,
        }
    }

    fn allocate_handle(&mut self) -> i32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// A unique 24-byte identifier: "AMQ ", the queue manager name, a counter.
    fn allocate_id(&mut self) -> [u8; 24] {
        let mut id = [b' '; 24];
        id[..4].copy_from_slice(b"AMQ ");
        let name = self.name.as_bytes();
        let n = name.len().min(12);
        id[4..4 + n].copy_from_slice(&name[..n]);
        id[16..].copy_from_slice(&self.next_id.to_be_bytes());
        self.next_id += 1;
        id
    }

    fn connection(&mut self, hconn: i32) -> Result<&mut ConnState, Status> {
        self.connections
            .get_mut(&hconn)
            .ok_or(failed(MQRC_HCONN_ERROR))
    }

    fn handle(&self, hconn: i32, hobj: i32) -> Result<&OpenHandle, Status> {
        self.connections
            .get(&hconn)
            .ok_or(failed(MQRC_HCONN_ERROR))?
            .handles
            .get(&hobj)
            .ok_or(failed(MQRC_HOBJ_ERROR))
    }

    fn check_q_mgr(&self, q_mgr_name: &str) -> Result<(), Status> {
        if q_mgr_name.is_empty() || q_mgr_name == self.name {
            Ok(())
        } else {
            Err(failed(MQRC_UNKNOWN_REMOTE_Q_MGR))
        }
    }

    // -----------------------------------------------------------------------
    //  Connections
    // -----------------------------------------------------------------------

    fn connect(&mut self, q_mgr_name: &str) -> Result<i32, Status> {
        if !self.available {
            return Err(failed(MQRC_Q_MGR_NOT_AVAILABLE));
        }
        if !q_mgr_name.is_empty() && q_mgr_name != self.name {
            return Err(failed(MQRC_Q_MGR_NAME_ERROR));
        }
        let hconn = self.allocate_handle();
        self.connections.insert(hconn, ConnState::default());
        Ok(hconn)
    }

    /// Commits outstanding work and closes every handle of the connection.
    fn disconnect(&mut self, hconn: i32) -> Result<(), Status> {
        self.commit(hconn)?;
        let handles: Vec<i32> = self.connection(hconn)?.handles.keys().copied().collect();
        for hobj in handles {
            self.close(hconn, hobj, MQCO_NONE)?;
        }
        self.connections.remove(&hconn);
        Ok(())
    }

    // -----------------------------------------------------------------------
    //  Objects
    // -----------------------------------------------------------------------

    /// Expand a dynamic queue template. A trailing `*` is replaced by a
    /// unique suffix.
    fn dynamic_name(&mut self, template: &str) -> Result<String, Status> {
        let template = template.trim();
        let name = match template.strip_suffix('*') {
            Some("") => return Err(failed(MQRC_DYNAMIC_Q_NAME_ERROR)),
            Some(prefix) => {
                self.next_dynamic += 1;
                format!("{prefix}{:016X}", self.next_dynamic - 1)
            }
            None if template.is_empty() => return Err(failed(MQRC_DYNAMIC_Q_NAME_ERROR)),
            None => template.to_string(),
        };
        if name.len() > 48 || name.contains('*') {
            return Err(failed(MQRC_DYNAMIC_Q_NAME_ERROR));
        }
        Ok(name)
    }

    fn open(&mut self, hconn: i32, od: &mut Mqod, options: i32) -> Result<i32, Status> {
        const USAGE: i32 = MQOO_INPUT_ANY | MQOO_BROWSE | MQOO_OUTPUT | MQOO_INQUIRE | MQOO_SET;

        self.connection(hconn)?;
        if od.object_type != MQOT_Q {
            return Err(failed(MQRC_OBJECT_TYPE_ERROR));
        }
        let input = options & MQOO_INPUT_ANY;
        if options & USAGE == 0 || input.count_ones() > 1 {
            return Err(failed(MQRC_OPTIONS_ERROR));
        }
        self.check_q_mgr(&od.object_qmgr_name)?;

        let definition = self
            .queues
            .get(&od.object_name)
            .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
        let model = (definition.q_type == MQQT_MODEL).then(|| definition.instantiate());
        let owns_queue = model.is_some();
        let name = match model {
            Some(queue) => {
                let name = self.dynamic_name(&od.dynamic_q_name)?;
                if self.queues.contains_key(&name) {
                    return Err(failed(MQRC_OBJECT_ALREADY_EXISTS));
                }
                debug!(queue = %name, model = %od.object_name, "created dynamic queue");
                self.queues.insert(name.clone(), queue);
                name
            }
            None => od.object_name.clone(),
        };

        let queue = self
            .queues
            .get_mut(&name)
            .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
        if input != 0 {
            if queue.exclusive || (input == MQOO_INPUT_EXCLUSIVE && queue.open_input > 0) {
                return Err(failed(MQRC_OBJECT_IN_USE));
            }
            queue.open_input += 1;
            queue.exclusive = input == MQOO_INPUT_EXCLUSIVE;
        }
        if options & MQOO_OUTPUT != 0 {
            queue.open_output += 1;
        }
        queue.open_handles += 1;

        od.object_name = name.clone();
        od.resolved_q_name = name.clone();
        od.resolved_qmgr_name = self.name.clone();

        let hobj = self.allocate_handle();
        self.connection(hconn)?.handles.insert(
            hobj,
            OpenHandle {
                queue: name,
                options,
                browse_cursor: None,
                owns_queue,
            },
        );
        Ok(hobj)
    }

    fn close(&mut self, hconn: i32, hobj: i32, options: i32) -> Result<(), Status> {
        if options & !(MQCO_DELETE | MQCO_DELETE_PURGE) != 0 {
            return Err(failed(MQRC_OPTIONS_ERROR));
        }
        let handle = self
            .connection(hconn)?
            .handles
            .remove(&hobj)
            .ok_or(failed(MQRC_HOBJ_ERROR))?;
        let Some(queue) = self.queues.get_mut(&handle.queue) else {
            return Ok(());
        };
        queue.open_handles -= 1;
        if handle.options & MQOO_INPUT_ANY != 0 {
            queue.open_input -= 1;
            if handle.options & MQOO_INPUT_EXCLUSIVE != 0 {
                queue.exclusive = false;
            }
        }
        if handle.options & MQOO_OUTPUT != 0 {
            queue.open_output -= 1;
        }
        if handle.owns_queue || (queue.temporary && options != MQCO_NONE) {
            queue.pending_delete = true;
        }
        if queue.pending_delete && queue.open_handles == 0 {
            debug!(queue = %handle.queue, "deleted dynamic queue");
            self.queues.remove(&handle.queue);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    //  Messages
    // -----------------------------------------------------------------------

    /// Returns whether the message is visible now.
    fn enqueue(
        &mut self,
        hconn: i32,
        queue_name: &str,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<bool, Status> {
        let msg_id = (pmo.has(MQPMO_NEW_MSG_ID) || md.msg_id == [0u8; 24]).then(|| self.allocate_id());
        let correl_id = pmo.has(MQPMO_NEW_CORREL_ID).then(|| self.allocate_id());
        let seq = self.next_seq;
        self.next_seq += 1;

        let queue = self
            .queues
            .get_mut(queue_name)
            .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
        if queue.inhibit_put {
            return Err(failed(MQRC_PUT_INHIBITED));
        }
        if queue.depth() >= queue.max_depth {
            return Err(failed(MQRC_Q_FULL));
        }
        if data.len() > queue.max_msg_length as usize {
            return Err(failed(MQRC_MSG_TOO_BIG_FOR_Q));
        }

        if let Some(id) = msg_id {
            md.msg_id = id;
        }
        if let Some(id) = correl_id {
            md.correl_id = id;
        }
        if md.persistence == MqPersistence::AsQueueDef {
            md.persistence = MqPersistence::from_raw(queue.def_persistence);
        }
        if md.priority == MqPriority::AsQueueDef {
            md.priority = MqPriority::from_raw(queue.def_priority);
        }
        let now = chrono::Utc::now();
        md.put_date = now.format("%Y%m%d").to_string();
        md.put_time = format!("{}{:02}", now.format("%H%M%S"), now.timestamp_subsec_millis() / 10);

        let syncpoint = pmo.has(MQPMO_SYNCPOINT);
        queue.messages.push_back(StoredMessage {
            seq,
            md: md.clone(),
            data: data.to_vec(),
            owner: syncpoint.then_some(hconn),
        });
        pmo.resolved_q_name = queue_name.to_string();
        pmo.resolved_qmgr_name = self.name.clone();

        if syncpoint {
            self.connection(hconn)?.uow.push(UowEntry::Put {
                queue: queue_name.to_string(),
                seq,
            });
        }
        Ok(!syncpoint)
    }

    fn put(
        &mut self,
        hconn: i32,
        hobj: i32,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<bool, Status> {
        let handle = self.handle(hconn, hobj)?;
        if handle.options & MQOO_OUTPUT == 0 {
            return Err(failed(MQRC_NOT_OPEN_FOR_OUTPUT));
        }
        let queue = handle.queue.clone();
        self.enqueue(hconn, &queue, md, pmo, data)
    }

    fn put1(
        &mut self,
        hconn: i32,
        od: &mut Mqod,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<bool, Status> {
        let hobj = self.open(hconn, od, MQOO_OUTPUT)?;
        let result = self.put(hconn, hobj, md, pmo, data);
        let closed = self.close(hconn, hobj, MQCO_NONE);
        let visible = result?;
        closed?;
        Ok(visible)
    }

    fn fetch(
        &mut self,
        hconn: i32,
        hobj: i32,
        md: &Mqmd,
        gmo: &Mqgmo,
        capacity: usize,
    ) -> Result<Fetch, Status> {
        let handle = self.handle(hconn, hobj)?;
        let browse_next = gmo.has(MQGMO_BROWSE_NEXT);
        let browse = browse_next || gmo.has(MQGMO_BROWSE_FIRST);
        if browse && handle.options & MQOO_BROWSE == 0 {
            return Err(failed(MQRC_NOT_OPEN_FOR_BROWSE));
        }
        if !browse && handle.options & MQOO_INPUT_ANY == 0 {
            return Err(failed(MQRC_NOT_OPEN_FOR_INPUT));
        }
        let cursor = if browse_next { handle.browse_cursor } else { None };
        let queue_name = handle.queue.clone();

        let match_msg_id = (gmo.match_options & MQMO_MATCH_MSG_ID != 0 && md.msg_id != [0u8; 24])
            .then_some(md.msg_id);
        let match_correl_id = (gmo.match_options & MQMO_MATCH_CORREL_ID != 0
            && md.correl_id != [0u8; 24])
            .then_some(md.correl_id);

        let queue = self
            .queues
            .get_mut(&queue_name)
            .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
        if !browse && queue.inhibit_get {
            return Err(failed(MQRC_GET_INHIBITED));
        }
        let position = queue.messages.iter().position(|m| {
            m.owner.is_none()
                && cursor.map_or(true, |c| m.seq > c)
                && match_msg_id.map_or(true, |id| m.md.msg_id == id)
                && match_correl_id.map_or(true, |id| m.md.correl_id == id)
        });
        let Some(index) = position else {
            return Ok(Fetch::Empty);
        };

        let candidate = &queue.messages[index];
        if candidate.data.len() > capacity && !gmo.has(MQGMO_ACCEPT_TRUNCATED_MSG) {
            return Ok(Fetch::TooBig {
                md: candidate.md.clone(),
                length: candidate.data.len(),
            });
        }

        if browse {
            let (seq, md, data) = (candidate.seq, candidate.md.clone(), candidate.data.clone());
            if let Some(handle) = self.connection(hconn)?.handles.get_mut(&hobj) {
                handle.browse_cursor = Some(seq);
            }
            return Ok(Fetch::Message { md, data });
        }

        let Some(message) = queue.messages.remove(index) else {
            return Ok(Fetch::Empty);
        };
        let syncpoint = gmo.has(MQGMO_SYNCPOINT)
            || (gmo.has(MQGMO_SYNCPOINT_IF_PERSISTENT)
                && message.md.persistence == MqPersistence::Persistent);
        let (md, data) = (message.md.clone(), message.data.clone());
        if syncpoint {
            self.connection(hconn)?.uow.push(UowEntry::Get {
                queue: queue_name,
                message,
            });
        }
        Ok(Fetch::Message { md, data })
    }

    // -----------------------------------------------------------------------
    //  Attributes
    // -----------------------------------------------------------------------

    fn inquire(&self, hconn: i32, hobj: i32, selectors: &[i32]) -> Result<Vec<i32>, Status> {
        let handle = self.handle(hconn, hobj)?;
        if handle.options & MQOO_INQUIRE == 0 {
            return Err(failed(MQRC_NOT_OPEN_FOR_INQUIRE));
        }
        let queue = self
            .queues
            .get(&handle.queue)
            .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
        selectors
            .iter()
            .map(|&selector| match selector {
                MQIA_CURRENT_Q_DEPTH => Ok(queue.depth()),
                MQIA_DEF_PERSISTENCE => Ok(queue.def_persistence),
                MQIA_DEF_PRIORITY => Ok(queue.def_priority),
                MQIA_INHIBIT_GET => Ok(queue.inhibit_get as i32),
                MQIA_INHIBIT_PUT => Ok(queue.inhibit_put as i32),
                MQIA_MAX_MSG_LENGTH => Ok(queue.max_msg_length),
                MQIA_MAX_Q_DEPTH => Ok(queue.max_depth),
                MQIA_OPEN_INPUT_COUNT => Ok(queue.open_input),
                MQIA_OPEN_OUTPUT_COUNT => Ok(queue.open_output),
                MQIA_Q_TYPE => Ok(queue.q_type),
                _ => Err(failed(MQRC_SELECTOR_ERROR)),
            })
            .collect()
    }

    fn set(&mut self, hconn: i32, hobj: i32, attributes: &[(i32, i32)]) -> Result<(), Status> {
        let handle = self.handle(hconn, hobj)?;
        if handle.options & MQOO_SET == 0 {
            return Err(failed(MQRC_NOT_OPEN_FOR_SET));
        }
        let name = handle.queue.clone();
        for &(selector, value) in attributes {
            if !matches!(selector, MQIA_INHIBIT_GET | MQIA_INHIBIT_PUT) {
                return Err(failed(MQRC_SELECTOR_ERROR));
            }
            if value != 0 && value != 1 {
                return Err(failed(MQRC_INHIBIT_VALUE_ERROR));
            }
        }
        let queue = self
            .queues
            .get_mut(&name)
            .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
        for &(selector, value) in attributes {
            match selector {
                MQIA_INHIBIT_GET => queue.inhibit_get = value == MQQA_GET_INHIBITED,
                _ => queue.inhibit_put = value == MQQA_PUT_INHIBITED,
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    //  Units of work
    // -----------------------------------------------------------------------

    fn commit(&mut self, hconn: i32) -> Result<(), Status> {
        let entries = std::mem::take(&mut self.connection(hconn)?.uow);
        for entry in entries {
            if let UowEntry::Put { queue, seq } = entry {
                if let Some(queue) = self.queues.get_mut(&queue) {
                    if let Some(m) = queue.messages.iter_mut().find(|m| m.seq == seq) {
                        m.owner = None;
                    }
                }
            }
        }
        Ok(())
    }

    fn backout(&mut self, hconn: i32) -> Result<(), Status> {
        let entries = std::mem::take(&mut self.connection(hconn)?.uow);
        for entry in entries.into_iter().rev() {
            match entry {
                UowEntry::Put { queue, seq } => {
                    if let Some(queue) = self.queues.get_mut(&queue) {
                        queue.messages.retain(|m| m.seq != seq);
                    }
                }
                UowEntry::Get { queue, mut message } => {
                    if let Some(queue) = self.queues.get_mut(&queue) {
                        message.md.backout_count += 1;
                        let at = queue
                            .messages
                            .iter()
                            .position(|m| m.seq > message.seq)
                            .unwrap_or(queue.messages.len());
                        queue.messages.insert(at, message);
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    //  Administration
    // -----------------------------------------------------------------------

    fn execute(&mut self, command: &Command) -> Result<Vec<ResponseItem>, Status> {
        match command.code {
            CommandCode::PingQMgr => Ok(vec![ResponseItem::new()]),
            CommandCode::InquireQ => self.inquire_queues(command),
            CommandCode::CreateQ => self.create_queue(command),
            CommandCode::ChangeQ => {
                let name = required_name(command)?;
                let queue = self
                    .queues
                    .get_mut(&name)
                    .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
                apply_attributes(queue, command)?;
                Ok(vec![ResponseItem::new()])
            }
            CommandCode::ClearQ => {
                let name = required_name(command)?;
                let queue = self
                    .queues
                    .get_mut(&name)
                    .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
                if queue.messages.iter().any(|m| m.owner.is_some()) {
                    return Err(failed(MQRC_OBJECT_IN_USE));
                }
                queue.messages.clear();
                Ok(vec![ResponseItem::new()])
            }
            CommandCode::DeleteQ => {
                let name = required_name(command)?;
                let queue = self
                    .queues
                    .get(&name)
                    .ok_or(failed(MQRC_UNKNOWN_OBJECT_NAME))?;
                if queue.open_handles > 0 {
                    return Err(failed(MQRC_OBJECT_IN_USE));
                }
                let purge = integer_parameter(command, Selector::PURGE)?.unwrap_or(0) != 0;
                if !queue.messages.is_empty() && !purge {
                    return Err(failed(MQRC_Q_NOT_EMPTY));
                }
                self.queues.remove(&name);
                Ok(vec![ResponseItem::new()])
            }
            CommandCode::Escape => self.escape(command),
            _ => Err(failed(MQRCCF_COMMAND_FAILED)),
        }
    }

    fn inquire_queues(&self, command: &Command) -> Result<Vec<ResponseItem>, Status> {
        let pattern = required_name(command)?;
        let q_type = integer_parameter(command, Selector::Q_TYPE)?.unwrap_or(MQQT_ALL);
        let wanted: Vec<Selector> = command.inquiries.clone();
        let filter = !wanted.is_empty() && !wanted.contains(&Selector::ALL);

        let items: Vec<ResponseItem> = self
            .queues
            .iter()
            .filter(|(name, q)| generic_match(&pattern, name) && (q_type == MQQT_ALL || q.q_type == q_type))
            .map(|(name, q)| {
                let mut item = describe_queue(name, q);
                if filter {
                    item.retain(|s, _| *s == Selector::Q_NAME || wanted.contains(s));
                }
                item
            })
            .collect();
        if items.is_empty() {
            return Err(failed(MQRC_UNKNOWN_OBJECT_NAME));
        }
        Ok(items)
    }

    fn create_queue(&mut self, command: &Command) -> Result<Vec<ResponseItem>, Status> {
        let name = required_name(command)?;
        if name.is_empty() || name.len() > 48 || name.contains('*') {
            return Err(failed(MQRC_UNKNOWN_OBJECT_NAME));
        }
        let q_type = integer_parameter(command, Selector::Q_TYPE)?.unwrap_or(MQQT_LOCAL);
        if q_type != MQQT_LOCAL && q_type != MQQT_MODEL {
            return Err(failed(MQRC_Q_TYPE_ERROR));
        }
        let replace = integer_parameter(command, Selector::REPLACE)?.unwrap_or(0) != 0;
        let mut queue = match self.queues.get(&name) {
            Some(_) if !replace => return Err(failed(MQRC_OBJECT_ALREADY_EXISTS)),
            Some(existing) if existing.q_type != q_type => return Err(failed(MQRC_Q_TYPE_ERROR)),
            Some(existing) => existing.clone(),
            None => LocalQueue::new(q_type),
        };
        apply_attributes(&mut queue, command)?;
        debug!(queue = %name, q_type, "defined queue");
        self.queues.insert(name, queue);
        Ok(vec![ResponseItem::new()])
    }

    fn escape(&mut self, command: &Command) -> Result<Vec<ResponseItem>, Status> {
        if integer_parameter(command, Selector::ESCAPE_TYPE)? != Some(MQET_MQSC) {
            return Err(failed(MQRCCF_ESCAPE_TYPE_ERROR));
        }
        let text = match command.parameter(Selector::ESCAPE_TEXT) {
            Some(BagValue::String(text)) => text.clone(),
            _ => return Err(failed(MQRCCF_MQSC_COMMAND_ERROR)),
        };
        let (translated, reply) = mqsc::translate(&text)?;
        let items = self.execute(&translated)?;
        let lines: Vec<String> = match reply {
            mqsc::Reply::Fixed(line) => vec![line.to_string()],
            mqsc::Reply::Display => items.iter().map(mqsc::display_text).collect(),
        };
        Ok(lines
            .into_iter()
            .map(|line| {
                let mut item = ResponseItem::new();
                item.insert(Selector::ESCAPE_TEXT, BagValue::String(line));
                item
            })
            .collect())
    }
}

fn required_name(command: &Command) -> Result<String, Status> {
    match command.parameter(Selector::Q_NAME) {
        Some(BagValue::String(name)) => Ok(name.clone()),
        _ => Err(failed(MQRC_UNKNOWN_OBJECT_NAME)),
    }
}

fn integer_parameter(command: &Command, selector: Selector) -> Result<Option<i32>, Status> {
    match command.parameter(selector) {
        None => Ok(None),
        Some(BagValue::Integer(value)) => Ok(Some(*value)),
        Some(BagValue::String(_)) => Err(failed(MQRC_SELECTOR_ERROR)),
    }
}

fn apply_attributes(queue: &mut LocalQueue, command: &Command) -> Result<(), Status> {
    for (selector, value) in &command.parameters {
        match (*selector, value) {
            (Selector::Q_NAME | Selector::Q_TYPE | Selector::REPLACE, _) => {}
            (Selector::Q_DESC, BagValue::String(text)) => queue.description = text.clone(),
            (Selector::MAX_Q_DEPTH, BagValue::Integer(v)) if *v >= 0 => queue.max_depth = *v,
            (Selector::MAX_MSG_LENGTH, BagValue::Integer(v)) if *v >= 0 => queue.max_msg_length = *v,
            (Selector::INHIBIT_GET, BagValue::Integer(v)) => queue.inhibit_get = *v == MQQA_GET_INHIBITED,
            (Selector::INHIBIT_PUT, BagValue::Integer(v)) => queue.inhibit_put = *v == MQQA_PUT_INHIBITED,
            (Selector::DEF_PERSISTENCE, BagValue::Integer(v)) => queue.def_persistence = *v,
            (Selector::DEF_PRIORITY, BagValue::Integer(v)) if (0..=9).contains(v) => queue.def_priority = *v,
            _ => return Err(failed(MQRC_SELECTOR_ERROR)),
        }
    }
    Ok(())
}

fn describe_queue(name: &str, queue: &LocalQueue) -> ResponseItem {
    let mut item = ResponseItem::new();
    item.insert(Selector::Q_NAME, BagValue::String(name.to_string()));
    item.insert(Selector::Q_TYPE, BagValue::Integer(queue.q_type));
    item.insert(Selector::Q_DESC, BagValue::String(queue.description.clone()));
    if queue.q_type == MQQT_LOCAL {
        item.insert(Selector::CURRENT_Q_DEPTH, BagValue::Integer(queue.depth()));
        item.insert(Selector::OPEN_INPUT_COUNT, BagValue::Integer(queue.open_input));
        item.insert(Selector::OPEN_OUTPUT_COUNT, BagValue::Integer(queue.open_output));
    }
    item.insert(Selector::MAX_Q_DEPTH, BagValue::Integer(queue.max_depth));
    item.insert(Selector::MAX_MSG_LENGTH, BagValue::Integer(queue.max_msg_length));
    item.insert(Selector::INHIBIT_GET, BagValue::Integer(queue.inhibit_get as i32));
    item.insert(Selector::INHIBIT_PUT, BagValue::Integer(queue.inhibit_put as i32));
    item.insert(Selector::DEF_PERSISTENCE, BagValue::Integer(queue.def_persistence));
    item.insert(Selector::DEF_PRIORITY, BagValue::Integer(queue.def_priority));
    item
}

// ---------------------------------------------------------------------------
//  MQSC subset
// ---------------------------------------------------------------------------

mod mqsc {
    use super::failed;
    use crate::admin::{BagValue, Command, CommandCode, ResponseItem, Selector};
    use crate::constants::*;
    use crate::error::Status;

    pub(super) enum Reply {
        Fixed(&'static str),
        Display,
    }

    type Token = (String, Option<String>);

    fn syntax_error() -> Status {
        failed(MQRCCF_MQSC_COMMAND_ERROR)
    }

    /// Split `KEYWORD` and `KEYWORD(value)` tokens. Keywords and unquoted
    /// values fold to upper case.
    pub(super) fn tokenize(text: &str) -> Result<Vec<Token>, Status> {
        let mut tokens = Vec::new();
        let mut chars = text.trim().chars().peekable();
        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let mut word = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '(') {
                word.push(c.to_ascii_uppercase());
            }
            if word.is_empty() {
                if chars.peek().is_none() {
                    break;
                }
                return Err(syntax_error());
            }
            let value = if chars.next_if_eq(&'(').is_some() {
                let mut value = String::new();
                let mut quoted = false;
                let mut closed = false;
                for c in chars.by_ref() {
                    match c {
                        '\'' => quoted = !quoted,
                        ')' if !quoted => {
                            closed = true;
                            break;
                        }
                        c if quoted => value.push(c),
                        c => value.push(c.to_ascii_uppercase()),
                    }
                }
                if !closed {
                    return Err(syntax_error());
                }
                Some(value.trim().to_string())
            } else {
                None
            };
            tokens.push((word, value));
        }
        Ok(tokens)
    }

    fn q_type(keyword: &str) -> Option<i32> {
        match keyword {
            "QLOCAL" | "QL" => Some(MQQT_LOCAL),
            "QMODEL" | "QM" => Some(MQQT_MODEL),
            "QUEUE" | "Q" => Some(MQQT_ALL),
            _ => None,
        }
    }

    fn number(value: &Option<String>) -> Result<i32, Status> {
        value
            .as_deref()
            .and_then(|v| v.parse().ok())
            .ok_or_else(syntax_error)
    }

    fn switch(value: &Option<String>, on: &str, off: &str) -> Result<i32, Status> {
        match value.as_deref() {
            Some(v) if v == on => Ok(1),
            Some(v) if v == off => Ok(0),
            _ => Err(syntax_error()),
        }
    }

    fn attributes(mut command: Command, tokens: &[Token]) -> Result<Command, Status> {
        for (keyword, value) in tokens {
            command = match keyword.as_str() {
                "MAXDEPTH" => command.with(Selector::MAX_Q_DEPTH, number(value)?),
                "MAXMSGL" => command.with(Selector::MAX_MSG_LENGTH, number(value)?),
                "DEFPRTY" => command.with(Selector::DEF_PRIORITY, number(value)?),
                "DEFPSIST" => command.with(Selector::DEF_PERSISTENCE, switch(value, "YES", "NO")?),
                "GET" => command.with(Selector::INHIBIT_GET, switch(value, "DISABLED", "ENABLED")?),
                "PUT" => command.with(Selector::INHIBIT_PUT, switch(value, "DISABLED", "ENABLED")?),
                "DESCR" => command.with(Selector::Q_DESC, value.clone().unwrap_or_default()),
                "REPLACE" => command.with(Selector::REPLACE, 1),
                "NOREPLACE" => command.with(Selector::REPLACE, 0),
                "PURGE" => command.with(Selector::PURGE, 1),
                "NOPURGE" => command.with(Selector::PURGE, 0),
                _ => return Err(syntax_error()),
            };
        }
        Ok(command)
    }

    /// Map an MQSC command onto the equivalent PCF command.
    pub(super) fn translate(text: &str) -> Result<(Command, Reply), Status> {
        let tokens = tokenize(text)?;
        let (verb, object, rest) = match tokens.as_slice() {
            [(verb, None), object, rest @ ..] => (verb.as_str(), object, rest),
            _ => return Err(syntax_error()),
        };

        if verb == "PING" {
            return match object {
                (keyword, None) if keyword == "QMGR" && rest.is_empty() => Ok((
                    Command::new(CommandCode::PingQMgr),
                    Reply::Fixed("AMQ8415I: Ping Queue Manager command complete."),
                )),
                _ => Err(syntax_error()),
            };
        }

        let (keyword, Some(name)) = object else {
            return Err(syntax_error());
        };
        let q_type = q_type(keyword).ok_or_else(syntax_error)?;
        let name = name.clone();

        match verb {
            "DEFINE" | "DEF" if q_type != MQQT_ALL => {
                let command = Command::new(CommandCode::CreateQ)
                    .with(Selector::Q_NAME, name)
                    .with(Selector::Q_TYPE, q_type);
                Ok((attributes(command, rest)?, Reply::Fixed("AMQ8006I: Queue created.")))
            }
            "ALTER" => {
                let command = Command::new(CommandCode::ChangeQ).with(Selector::Q_NAME, name);
                Ok((attributes(command, rest)?, Reply::Fixed("AMQ8008I: Queue changed.")))
            }
            "DELETE" => {
                let command = Command::new(CommandCode::DeleteQ).with(Selector::Q_NAME, name);
                Ok((attributes(command, rest)?, Reply::Fixed("AMQ8007I: Queue deleted.")))
            }
            "CLEAR" if rest.is_empty() => Ok((
                Command::new(CommandCode::ClearQ).with(Selector::Q_NAME, name),
                Reply::Fixed("AMQ8022I: Queue cleared."),
            )),
            "DISPLAY" | "DIS" => Ok((
                Command::new(CommandCode::InquireQ)
                    .with(Selector::Q_NAME, name)
                    .with(Selector::Q_TYPE, q_type),
                Reply::Display,
            )),
            _ => Err(syntax_error()),
        }
    }

    pub(super) fn display_text(item: &ResponseItem) -> String {
        let text = |s: Selector| item.get(&s).and_then(BagValue::as_str).unwrap_or_default().to_string();
        let int = |s: Selector| item.get(&s).and_then(BagValue::as_integer);
        let q_type = match int(Selector::Q_TYPE) {
            Some(MQQT_MODEL) => "QMODEL",
            _ => "QLOCAL",
        };
        let mut out = format!(
            "AMQ8409I: Display Queue details.\n   QUEUE({})\n   TYPE({q_type})",
            text(Selector::Q_NAME)
        );
        if let Some(depth) = int(Selector::CURRENT_Q_DEPTH) {
            out.push_str(&format!("\n   CURDEPTH({depth})"));
        }
        if let Some(max) = int(Selector::MAX_Q_DEPTH) {
            out.push_str(&format!("\n   MAXDEPTH({max})"));
        }
        let descr = text(Selector::Q_DESC);
        if !descr.is_empty() {
            out.push_str(&format!("\n   DESCR({descr})"));
        }
        out
    }
}

// ---------------------------------------------------------------------------
//  Provider and transport
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Shared {
    broker: Mutex<Broker>,
    arrived: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Broker> {
        self.broker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Provider backed by an in-process queue manager.
///
/// Clones share the same queue manager, so several [`QueueManager`]
/// instances built from one provider see each other's messages.
///
/// [`QueueManager`]: crate::QueueManager
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    shared: Arc<Shared>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new("QM1")
    }
}

impl InMemoryProvider {
    /// A queue manager called `q_mgr_name` holding only the system queues.
    pub fn new(q_mgr_name: &str) -> Self {
        Self {
            shared: Arc::new(Shared {
                broker: Mutex::new(Broker::new(q_mgr_name)),
                arrived: Condvar::new(),
            }),
        }
    }

    pub fn name(&self) -> String {
        self.shared.lock().name.clone()
    }

    /// Define a local queue. An existing queue is left untouched.
    pub fn define_queue(&self, name: &str) {
        self.shared
            .lock()
            .queues
            .entry(name.to_string())
            .or_insert_with(|| LocalQueue::new(MQQT_LOCAL));
    }

    /// Define a model queue for dynamic queue creation.
    pub fn define_model_queue(&self, name: &str) {
        self.shared
            .lock()
            .queues
            .entry(name.to_string())
            .or_insert_with(|| LocalQueue::new(MQQT_MODEL));
    }

    /// Messages on `name`, including uncommitted puts.
    pub fn depth(&self, name: &str) -> Option<usize> {
        self.shared.lock().queues.get(name).map(|q| q.messages.len())
    }

    pub fn queue_exists(&self, name: &str) -> bool {
        self.shared.lock().queues.contains_key(name)
    }

    /// Open object handles across all connections.
    pub fn open_handles(&self) -> usize {
        self.shared
            .lock()
            .connections
            .values()
            .map(|c| c.handles.len())
            .sum()
    }

    pub fn connection_count(&self) -> usize {
        self.shared.lock().connections.len()
    }

    /// Make later connects fail with MQRC_Q_MGR_NOT_AVAILABLE.
    pub fn set_available(&self, available: bool) {
        self.shared.lock().available = available;
    }
}

impl TransportProvider for InMemoryProvider {
    fn load(&self, mode: TransportMode, options: &ConnectOptions) -> crate::Result<Box<dyn Transport>> {
        if options.trace_level >= 2 {
            debug!(mode = %mode, "binding in-memory transport");
        }
        Ok(Box::new(MemoryTransport {
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }
}

/// One connection's view of the in-process queue manager.
#[derive(Debug)]
pub struct MemoryTransport {
    shared: Arc<Shared>,
    released: bool,
}

impl MemoryTransport {
    fn broker(&self) -> Result<MutexGuard<'_, Broker>, Status> {
        if self.released {
            return Err(failed(MQRC_ENVIRONMENT_ERROR));
        }
        Ok(self.shared.lock())
    }

    fn wake(&self) {
        self.shared.arrived.notify_all();
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, q_mgr_name: &str, _options: &ConnectOptions) -> Result<Hconn, Status> {
        self.broker()?.connect(q_mgr_name).map(Hconn)
    }

    fn disconnect(&mut self, hconn: Hconn) -> Result<(), Status> {
        self.broker()?.disconnect(hconn.0)?;
        self.wake();
        Ok(())
    }

    fn open(&mut self, hconn: Hconn, od: &mut Mqod, options: i32) -> Result<Hobj, Status> {
        self.broker()?.open(hconn.0, od, options).map(Hobj)
    }

    fn close(&mut self, hconn: Hconn, hobj: Hobj, options: i32) -> Result<(), Status> {
        self.broker()?.close(hconn.0, hobj.0, options)
    }

    fn put(
        &mut self,
        hconn: Hconn,
        hobj: Hobj,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<(), Status> {
        if self.broker()?.put(hconn.0, hobj.0, md, pmo, data)? {
            self.wake();
        }
        Ok(())
    }

    fn put1(
        &mut self,
        hconn: Hconn,
        od: &mut Mqod,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<(), Status> {
        if self.broker()?.put1(hconn.0, od, md, pmo, data)? {
            self.wake();
        }
        Ok(())
    }

    fn get(
        &mut self,
        hconn: Hconn,
        hobj: Hobj,
        md: &mut Mqmd,
        gmo: &mut Mqgmo,
        buffer: &mut [u8],
        data_length: &mut usize,
    ) -> Result<(), Status> {
        let deadline = match (gmo.has(MQGMO_WAIT), gmo.wait_interval) {
            (false, _) => Some(Instant::now()),
            (true, MQWI_UNLIMITED) => None,
            (true, ms) => Some(Instant::now() + Duration::from_millis(ms.max(0) as u64)),
        };

        let mut broker = self.broker()?;
        let fetched = loop {
            match broker.fetch(hconn.0, hobj.0, md, gmo, buffer.len())? {
                Fetch::Empty => {}
                found => break found,
            }
            broker = match deadline {
                None => self
                    .shared
                    .arrived
                    .wait(broker)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(failed(MQRC_NO_MSG_AVAILABLE));
                    }
                    self.shared
                        .arrived
                        .wait_timeout(broker, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        };
        gmo.resolved_q_name = broker
            .handle(hconn.0, hobj.0)
            .map(|h| h.queue.clone())
            .unwrap_or_default();
        drop(broker);

        match fetched {
            Fetch::TooBig { md: found, length } => {
                *md = found;
                *data_length = length;
                Err(failed(MQRC_TRUNCATED_MSG_FAILED))
            }
            Fetch::Message { md: found, data } => {
                *md = found;
                *data_length = data.len();
                let n = data.len().min(buffer.len());
                buffer[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    Err(Status::warning(MQRC_TRUNCATED_MSG_ACCEPTED))
                } else {
                    Ok(())
                }
            }
            Fetch::Empty => Err(failed(MQRC_NO_MSG_AVAILABLE)),
        }
    }

    fn inquire(&mut self, hconn: Hconn, hobj: Hobj, selectors: &[i32]) -> Result<Vec<i32>, Status> {
        self.broker()?.inquire(hconn.0, hobj.0, selectors)
    }

    fn set(&mut self, hconn: Hconn, hobj: Hobj, attributes: &[(i32, i32)]) -> Result<(), Status> {
        self.broker()?.set(hconn.0, hobj.0, attributes)
    }

    fn begin(&mut self, hconn: Hconn) -> Result<(), Status> {
        self.broker()?.connection(hconn.0).map(|_| ())
    }

    fn commit(&mut self, hconn: Hconn) -> Result<(), Status> {
        self.broker()?.commit(hconn.0)?;
        self.wake();
        Ok(())
    }

    fn backout(&mut self, hconn: Hconn) -> Result<(), Status> {
        self.broker()?.backout(hconn.0)?;
        self.wake();
        Ok(())
    }

    fn execute(&mut self, hconn: Hconn, command: &Command) -> Result<Vec<ResponseItem>, Status> {
        let mut broker = self.broker()?;
        broker.connection(hconn.0)?;
        broker.execute(command)
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn setup() -> (InMemoryProvider, Box<dyn Transport>, Hconn) {
        let provider = InMemoryProvider::new("QM1");
        provider.define_queue("TEST.Q");
        let options = ConnectOptions::local("QM1");
        let mut transport = provider.load(TransportMode::Local, &options).unwrap();
        let hconn = transport.connect("QM1", &options).unwrap();
        (provider, transport, hconn)
    }

    fn open(transport: &mut Box<dyn Transport>, hconn: Hconn, name: &str, options: i32) -> Hobj {
        let mut od = Mqod {
            object_name: name.into(),
            ..Default::default()
        };
        transport.open(hconn, &mut od, options).unwrap()
    }

    fn put(transport: &mut Box<dyn Transport>, hconn: Hconn, hobj: Hobj, data: &[u8], pmo: i32) -> Mqmd {
        let mut md = Mqmd::default();
        let mut pmo = MqPmo {
            options: pmo,
            ..Default::default()
        };
        transport.put(hconn, hobj, &mut md, &mut pmo, data).unwrap();
        md
    }

    fn get(transport: &mut Box<dyn Transport>, hconn: Hconn, hobj: Hobj, gmo: i32) -> Result<Vec<u8>, Status> {
        let mut md = Mqmd::default();
        let mut gmo = Mqgmo {
            options: gmo,
            ..Default::default()
        };
        let mut buffer = vec![0u8; 1024];
        let mut length = 0;
        transport.get(hconn, hobj, &mut md, &mut gmo, &mut buffer, &mut length)?;
        buffer.truncate(length);
        Ok(buffer)
    }

    #[test]
    fn test_connect_checks_name_and_availability() {
        let provider = InMemoryProvider::new("QM1");
        let options = ConnectOptions::local("QM1");
        let mut transport = provider.load(TransportMode::Local, &options).unwrap();
        assert_eq!(
            transport.connect("OTHER", &options).unwrap_err().reason_code,
            MQRC_Q_MGR_NAME_ERROR
        );
        assert!(transport.connect("", &options).is_ok());

        provider.set_available(false);
        assert_eq!(
            transport.connect("QM1", &options).unwrap_err().reason_code,
            MQRC_Q_MGR_NOT_AVAILABLE
        );
    }

    #[test]
    fn test_put_then_get_in_order() {
        let (_provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);
        let md = put(&mut t, hconn, out, b"one", MQPMO_NONE);
        put(&mut t, hconn, out, b"two", MQPMO_NONE);

        assert_ne!(md.msg_id, [0u8; 24]);
        assert_eq!(md.put_date.len(), 8);
        assert_eq!(md.persistence, MqPersistence::NotPersistent);
        assert_eq!(get(&mut t, hconn, input, MQGMO_NO_WAIT).unwrap(), b"one");
        assert_eq!(get(&mut t, hconn, input, MQGMO_NO_WAIT).unwrap(), b"two");
        assert_eq!(
            get(&mut t, hconn, input, MQGMO_NO_WAIT).unwrap_err().reason_code,
            MQRC_NO_MSG_AVAILABLE
        );
    }

    #[test]
    fn test_handles_are_never_reused() {
        let (provider, mut t, hconn) = setup();
        let first = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        t.close(hconn, first, MQCO_NONE).unwrap();
        let second = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        assert_ne!(first, second);
        assert_eq!(
            t.close(hconn, first, MQCO_NONE).unwrap_err().reason_code,
            MQRC_HOBJ_ERROR
        );
        assert_eq!(provider.open_handles(), 1);
    }

    #[test]
    fn test_open_errors() {
        let (_provider, mut t, hconn) = setup();
        let mut od = Mqod {
            object_name: "NO.SUCH.Q".into(),
            ..Default::default()
        };
        assert_eq!(
            t.open(hconn, &mut od, MQOO_OUTPUT).unwrap_err().reason_code,
            MQRC_UNKNOWN_OBJECT_NAME
        );
        let mut od = Mqod {
            object_name: "TEST.Q".into(),
            ..Default::default()
        };
        assert_eq!(
            t.open(hconn, &mut od, MQOO_FAIL_IF_QUIESCING).unwrap_err().reason_code,
            MQRC_OPTIONS_ERROR
        );
        od.object_qmgr_name = "REMOTE".into();
        assert_eq!(
            t.open(hconn, &mut od, MQOO_OUTPUT).unwrap_err().reason_code,
            MQRC_UNKNOWN_REMOTE_Q_MGR
        );
    }

    #[test]
    fn test_exclusive_input() {
        let (_provider, mut t, hconn) = setup();
        let exclusive = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_EXCLUSIVE);
        let mut od = Mqod {
            object_name: "TEST.Q".into(),
            ..Default::default()
        };
        assert_eq!(
            t.open(hconn, &mut od, MQOO_INPUT_SHARED).unwrap_err().reason_code,
            MQRC_OBJECT_IN_USE
        );
        t.close(hconn, exclusive, MQCO_NONE).unwrap();
        assert!(t.open(hconn, &mut od, MQOO_INPUT_SHARED).is_ok());
    }

    #[test]
    fn test_syncpoint_put_visible_after_commit() {
        let (provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);
        put(&mut t, hconn, out, b"pending", MQPMO_SYNCPOINT);

        assert_eq!(provider.depth("TEST.Q"), Some(1));
        assert!(get(&mut t, hconn, input, MQGMO_NO_WAIT).is_err());
        t.commit(hconn).unwrap();
        assert_eq!(get(&mut t, hconn, input, MQGMO_NO_WAIT).unwrap(), b"pending");
    }

    #[test]
    fn test_backout_discards_puts_and_restores_gets() {
        let (provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);
        put(&mut t, hconn, out, b"first", MQPMO_NONE);
        put(&mut t, hconn, out, b"second", MQPMO_NONE);
        put(&mut t, hconn, out, b"uncommitted", MQPMO_SYNCPOINT);

        assert_eq!(get(&mut t, hconn, input, MQGMO_SYNCPOINT).unwrap(), b"first");
        t.backout(hconn).unwrap();
        assert_eq!(provider.depth("TEST.Q"), Some(2));

        let mut md = Mqmd::default();
        let mut gmo = Mqgmo::default();
        let mut buffer = vec![0u8; 64];
        let mut length = 0;
        t.get(hconn, input, &mut md, &mut gmo, &mut buffer, &mut length).unwrap();
        assert_eq!(&buffer[..length], b"first");
        assert_eq!(md.backout_count, 1);
    }

    #[test]
    fn test_truncation() {
        let (provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);
        put(&mut t, hconn, out, b"0123456789", MQPMO_NONE);

        let mut md = Mqmd::default();
        let mut gmo = Mqgmo::default();
        let mut small = [0u8; 4];
        let mut length = 0;
        let err = t.get(hconn, input, &mut md, &mut gmo, &mut small, &mut length).unwrap_err();
        assert_eq!(err.reason_code, MQRC_TRUNCATED_MSG_FAILED);
        assert_eq!(length, 10);
        assert_eq!(provider.depth("TEST.Q"), Some(1));

        gmo.options |= MQGMO_ACCEPT_TRUNCATED_MSG;
        let warning = t.get(hconn, input, &mut md, &mut gmo, &mut small, &mut length).unwrap_err();
        assert_eq!(warning.comp_code, MQCC_WARNING);
        assert_eq!(warning.reason_code, MQRC_TRUNCATED_MSG_ACCEPTED);
        assert_eq!(&small, b"0123");
        assert_eq!(provider.depth("TEST.Q"), Some(0));
    }

    #[test]
    fn test_browse_does_not_remove() {
        let (provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        let browse = open(&mut t, hconn, "TEST.Q", MQOO_BROWSE);
        put(&mut t, hconn, out, b"a", MQPMO_NONE);
        put(&mut t, hconn, out, b"b", MQPMO_NONE);

        assert_eq!(get(&mut t, hconn, browse, MQGMO_BROWSE_FIRST).unwrap(), b"a");
        assert_eq!(get(&mut t, hconn, browse, MQGMO_BROWSE_NEXT).unwrap(), b"b");
        assert!(get(&mut t, hconn, browse, MQGMO_BROWSE_NEXT).is_err());
        assert_eq!(provider.depth("TEST.Q"), Some(2));
        assert_eq!(
            get(&mut t, hconn, browse, MQGMO_NO_WAIT).unwrap_err().reason_code,
            MQRC_NOT_OPEN_FOR_INPUT
        );
    }

    #[test]
    fn test_match_correl_id() {
        let (_provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);
        put(&mut t, hconn, out, b"other", MQPMO_NONE);
        let wanted = put(&mut t, hconn, out, b"wanted", MQPMO_NEW_CORREL_ID);

        let mut md = Mqmd {
            correl_id: wanted.correl_id,
            ..Default::default()
        };
        let mut gmo = Mqgmo {
            match_options: MQMO_MATCH_CORREL_ID,
            ..Default::default()
        };
        let mut buffer = vec![0u8; 16];
        let mut length = 0;
        t.get(hconn, input, &mut md, &mut gmo, &mut buffer, &mut length).unwrap();
        assert_eq!(&buffer[..length], b"wanted");
    }

    #[test]
    fn test_wait_wakes_on_put_from_other_connection() {
        let (provider, mut t, hconn) = setup();
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);

        let producer = provider.clone();
        let handle = thread::spawn(move || {
            let options = ConnectOptions::local("QM1");
            let mut t = producer.load(TransportMode::Local, &options).unwrap();
            let hconn = t.connect("QM1", &options).unwrap();
            thread::sleep(Duration::from_millis(50));
            let mut od = Mqod {
                object_name: "TEST.Q".into(),
                ..Default::default()
            };
            let mut md = Mqmd::default();
            let mut pmo = MqPmo::default();
            t.put1(hconn, &mut od, &mut md, &mut pmo, b"late").unwrap();
            t.disconnect(hconn).unwrap();
        });

        let mut md = Mqmd::default();
        let mut gmo = Mqgmo {
            options: MQGMO_WAIT,
            wait_interval: 5000,
            ..Default::default()
        };
        let mut buffer = vec![0u8; 16];
        let mut length = 0;
        t.get(hconn, input, &mut md, &mut gmo, &mut buffer, &mut length).unwrap();
        assert_eq!(&buffer[..length], b"late");
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_times_out() {
        let (_provider, mut t, hconn) = setup();
        let input = open(&mut t, hconn, "TEST.Q", MQOO_INPUT_SHARED);
        let start = Instant::now();
        let err = get(&mut t, hconn, input, MQGMO_WAIT).unwrap_err();
        assert_eq!(err.reason_code, MQRC_NO_MSG_AVAILABLE);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_dynamic_queue_from_model() {
        let (provider, mut t, hconn) = setup();
        let mut od = Mqod {
            object_name: DEFAULT_MODEL_QUEUE.into(),
            dynamic_q_name: "APP.REPLY.*".into(),
            ..Default::default()
        };
        let hobj = t.open(hconn, &mut od, MQOO_INPUT_EXCLUSIVE).unwrap();
        assert!(od.object_name.starts_with("APP.REPLY."));
        assert!(provider.queue_exists(&od.object_name));

        t.close(hconn, hobj, MQCO_NONE).unwrap();
        assert!(!provider.queue_exists(&od.object_name));
    }

    #[test]
    fn test_dynamic_queue_outlives_creator_until_last_close() {
        let (provider, mut t, hconn) = setup();
        let mut od = Mqod {
            object_name: DEFAULT_MODEL_QUEUE.into(),
            dynamic_q_name: "APP.TEMP.*".into(),
            ..Default::default()
        };
        let creator = t.open(hconn, &mut od, MQOO_INPUT_EXCLUSIVE).unwrap();
        let name = od.object_name.clone();
        let writer = open(&mut t, hconn, &name, MQOO_OUTPUT);

        t.close(hconn, creator, MQCO_NONE).unwrap();
        assert!(provider.queue_exists(&name));

        t.close(hconn, writer, MQCO_NONE).unwrap();
        assert!(!provider.queue_exists(&name));
    }

    #[test]
    fn test_fixed_dynamic_name_already_exists() {
        let (_provider, mut t, hconn) = setup();
        let mut od = Mqod {
            object_name: DEFAULT_MODEL_QUEUE.into(),
            dynamic_q_name: "APP.FIXED".into(),
            ..Default::default()
        };
        t.open(hconn, &mut od, MQOO_OUTPUT).unwrap();
        let mut again = Mqod {
            object_name: DEFAULT_MODEL_QUEUE.into(),
            dynamic_q_name: "APP.FIXED".into(),
            ..Default::default()
        };
        assert_eq!(
            t.open(hconn, &mut again, MQOO_OUTPUT).unwrap_err().reason_code,
            MQRC_OBJECT_ALREADY_EXISTS
        );
    }

    #[test]
    fn test_inquire_and_set() {
        let (_provider, mut t, hconn) = setup();
        let hobj = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT | MQOO_INQUIRE | MQOO_SET);
        put(&mut t, hconn, hobj, b"x", MQPMO_NONE);
        assert_eq!(
            t.inquire(hconn, hobj, &[MQIA_CURRENT_Q_DEPTH, MQIA_Q_TYPE]).unwrap(),
            vec![1, MQQT_LOCAL]
        );
        t.set(hconn, hobj, &[(MQIA_INHIBIT_PUT, MQQA_PUT_INHIBITED)]).unwrap();
        let mut md = Mqmd::default();
        let mut pmo = MqPmo::default();
        assert_eq!(
            t.put(hconn, hobj, &mut md, &mut pmo, b"y").unwrap_err().reason_code,
            MQRC_PUT_INHIBITED
        );
        assert_eq!(
            t.set(hconn, hobj, &[(MQIA_MAX_Q_DEPTH, 1)]).unwrap_err().reason_code,
            MQRC_SELECTOR_ERROR
        );
    }

    #[test]
    fn test_disconnect_commits_and_closes() {
        let (provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        put(&mut t, hconn, out, b"kept", MQPMO_SYNCPOINT);
        t.disconnect(hconn).unwrap();
        assert_eq!(provider.open_handles(), 0);
        assert_eq!(provider.connection_count(), 0);
        assert_eq!(provider.depth("TEST.Q"), Some(1));
    }

    #[test]
    fn test_release_blocks_further_calls() {
        let (_provider, mut t, hconn) = setup();
        t.release();
        t.release();
        assert_eq!(t.begin(hconn).unwrap_err().reason_code, MQRC_ENVIRONMENT_ERROR);
    }

    #[test]
    fn test_pcf_create_inquire_delete() {
        let (_provider, mut t, hconn) = setup();
        let create = Command::new(CommandCode::CreateQ)
            .with(Selector::Q_NAME, "APP.IN")
            .with(Selector::MAX_Q_DEPTH, 10)
            .with(Selector::Q_DESC, "inbound");
        t.execute(hconn, &create).unwrap();
        assert_eq!(
            t.execute(hconn, &create).unwrap_err().reason_code,
            MQRC_OBJECT_ALREADY_EXISTS
        );

        let inquire = Command::new(CommandCode::InquireQ)
            .with(Selector::Q_NAME, "APP.*")
            .inquire(Selector::MAX_Q_DEPTH);
        let items = t.execute(hconn, &inquire).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0][&Selector::Q_NAME], BagValue::String("APP.IN".into()));
        assert_eq!(items[0][&Selector::MAX_Q_DEPTH], BagValue::Integer(10));
        assert!(!items[0].contains_key(&Selector::Q_DESC));

        let delete = Command::new(CommandCode::DeleteQ).with(Selector::Q_NAME, "APP.IN");
        t.execute(hconn, &delete).unwrap();
        assert_eq!(
            t.execute(hconn, &inquire).unwrap_err().reason_code,
            MQRC_UNKNOWN_OBJECT_NAME
        );
    }

    #[test]
    fn test_delete_non_empty_needs_purge() {
        let (_provider, mut t, hconn) = setup();
        let out = open(&mut t, hconn, "TEST.Q", MQOO_OUTPUT);
        put(&mut t, hconn, out, b"x", MQPMO_NONE);
        t.close(hconn, out, MQCO_NONE).unwrap();

        let delete = Command::new(CommandCode::DeleteQ).with(Selector::Q_NAME, "TEST.Q");
        assert_eq!(t.execute(hconn, &delete).unwrap_err().reason_code, MQRC_Q_NOT_EMPTY);
        t.execute(hconn, &delete.with(Selector::PURGE, 1)).unwrap();
    }

    #[test]
    fn test_mqsc_tokenize() {
        let tokens = mqsc::tokenize("define qlocal(app.q) descr('Mixed Case') replace").unwrap();
        assert_eq!(
            tokens,
            vec![
                ("DEFINE".to_string(), None),
                ("QLOCAL".to_string(), Some("APP.Q".to_string())),
                ("DESCR".to_string(), Some("Mixed Case".to_string())),
                ("REPLACE".to_string(), None),
            ]
        );
        assert!(mqsc::tokenize("DEFINE QLOCAL(UNTERMINATED").is_err());
    }

    #[test]
    fn test_mqsc_escape() {
        let (_provider, mut t, hconn) = setup();
        let escape = |text: &str| {
            Command::new(CommandCode::Escape)
                .with(Selector::ESCAPE_TYPE, MQET_MQSC)
                .with(Selector::ESCAPE_TEXT, text)
        };
        let created = t.execute(hconn, &escape("DEFINE QLOCAL(MQSC.Q) MAXDEPTH(7)")).unwrap();
        assert_eq!(
            created[0][&Selector::ESCAPE_TEXT],
            BagValue::String("AMQ8006I: Queue created.".into())
        );

        let shown = t.execute(hconn, &escape("DIS QL(MQSC.*)")).unwrap();
        let text = shown[0][&Selector::ESCAPE_TEXT].as_str().unwrap().to_string();
        assert!(text.contains("QUEUE(MQSC.Q)"));
        assert!(text.contains("MAXDEPTH(7)"));

        assert_eq!(
            t.execute(hconn, &escape("LAUNCH ROCKETS")).unwrap_err().reason_code,
            MQRCCF_MQSC_COMMAND_ERROR
        );
        let wrong_type = Command::new(CommandCode::Escape).with(Selector::ESCAPE_TYPE, 99);
        assert_eq!(
            t.execute(hconn, &wrong_type).unwrap_err().reason_code,
            MQRCCF_ESCAPE_TYPE_ERROR
        );
    }
}
