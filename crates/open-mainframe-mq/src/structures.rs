//! MQ Data Structures: MQMD, MQOD, MQGMO, MQPMO, MQDLH.
//!
//! These are the Rust-side views of the MQI structures. String fields hold
//! the trimmed value; the fixed-width, blank-padded layout only exists at the
//! transport boundary (see [`crate::transport::ffi`]).

use serde::{Deserialize, Serialize};

use crate::constants::*;

// ---------------------------------------------------------------------------
//  MQMD: Message Descriptor
// ---------------------------------------------------------------------------

/// Message persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MqPersistence {
    /// Message is not persistent (lost on queue manager restart).
    NotPersistent,
    /// Message is persistent (survives queue manager restart).
    Persistent,
    /// Use the queue's default persistence.
    #[default]
    AsQueueDef,
}

impl MqPersistence {
    pub fn from_raw(value: i32) -> Self {
        match value {
            MQPER_NOT_PERSISTENT => Self::NotPersistent,
            MQPER_PERSISTENT => Self::Persistent,
            _ => Self::AsQueueDef,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::NotPersistent => MQPER_NOT_PERSISTENT,
            Self::Persistent => MQPER_PERSISTENT,
            Self::AsQueueDef => MQPER_PERSISTENCE_AS_Q_DEF,
        }
    }
}

impl From<bool> for MqPersistence {
    fn from(persistent: bool) -> Self {
        if persistent {
            Self::Persistent
        } else {
            Self::NotPersistent
        }
    }
}

/// Message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MqPriority {
    /// Use queue default priority.
    #[default]
    AsQueueDef,
    /// Explicit priority (0-9, higher = more important).
    Priority(u8),
}

impl MqPriority {
    pub fn from_raw(value: i32) -> Self {
        match u8::try_from(value) {
            Ok(p) => Self::Priority(p),
            Err(_) => Self::AsQueueDef,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::AsQueueDef => MQPRI_PRIORITY_AS_Q_DEF,
            Self::Priority(p) => i32::from(p),
        }
    }
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MqMsgType {
    /// Normal datagram message.
    #[default]
    Datagram,
    /// Request message (expects a reply).
    Request,
    /// Reply message.
    Reply,
    /// Report message.
    Report,
    /// Application-defined or system-defined type not listed above.
    Other(i32),
}

impl MqMsgType {
    pub fn from_raw(value: i32) -> Self {
        match value {
            MQMT_DATAGRAM => Self::Datagram,
            MQMT_REQUEST => Self::Request,
            MQMT_REPLY => Self::Reply,
            MQMT_REPORT => Self::Report,
            other => Self::Other(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Self::Datagram => MQMT_DATAGRAM,
            Self::Request => MQMT_REQUEST,
            Self::Reply => MQMT_REPLY,
            Self::Report => MQMT_REPORT,
            Self::Other(value) => value,
        }
    }
}

/// MQMD: Message Descriptor (version 2 fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mqmd {
    /// Report options (MQRO_*).
    pub report: i32,
    /// Message type.
    pub msg_type: MqMsgType,
    /// Expiry (tenths of a second, -1 = unlimited).
    pub expiry: i32,
    /// Feedback code (for report messages).
    pub feedback: i32,
    /// Numeric encoding of the payload.
    pub encoding: i32,
    /// Character set of the payload (0 = queue manager's).
    pub coded_char_set_id: i32,
    /// Format name (e.g., "MQSTR"); empty means MQFMT_NONE.
    pub format: String,
    /// Message priority.
    pub priority: MqPriority,
    /// Message persistence.
    pub persistence: MqPersistence,
    /// Message ID (24 bytes).
    pub msg_id: [u8; 24],
    /// Correlation ID (24 bytes).
    pub correl_id: [u8; 24],
    /// Number of times the message has been backed out.
    pub backout_count: i32,
    /// Reply-to queue name.
    pub reply_to_q: String,
    /// Reply-to queue manager.
    pub reply_to_q_mgr: String,
    /// User identifier.
    pub user_identifier: String,
    /// Accounting token (32 bytes).
    pub accounting_token: [u8; 32],
    /// Application identity data.
    pub appl_identity_data: String,
    /// Put application type.
    pub put_appl_type: i32,
    /// Put application name.
    pub put_appl_name: String,
    /// Put date (YYYYMMDD).
    pub put_date: String,
    /// Put time (HHMMSSTH).
    pub put_time: String,
    /// Application origin data.
    pub appl_origin_data: String,
    /// Group ID (24 bytes).
    pub group_id: [u8; 24],
    /// Sequence number in group.
    pub msg_seq_number: i32,
    /// Offset in group.
    pub offset: i32,
    /// Message flags.
    pub msg_flags: i32,
    /// Original length (-1 if not a segment).
    pub original_length: i32,
}

impl Default for Mqmd {
    fn default() -> Self {
        Self {
            report: MQRO_NONE,
            msg_type: MqMsgType::Datagram,
            expiry: MQEI_UNLIMITED,
            feedback: MQFB_NONE,
            encoding: MQENC_NATIVE,
            coded_char_set_id: MQCCSI_Q_MGR,
            format: MQFMT_NONE.to_string(),
            priority: MqPriority::AsQueueDef,
            persistence: MqPersistence::AsQueueDef,
            msg_id: [0u8; 24],
            correl_id: [0u8; 24],
            backout_count: 0,
            reply_to_q: String::new(),
            reply_to_q_mgr: String::new(),
            user_identifier: String::new(),
            accounting_token: [0u8; 32],
            appl_identity_data: String::new(),
            put_appl_type: MQAT_NO_CONTEXT,
            put_appl_name: String::new(),
            put_date: String::new(),
            put_time: String::new(),
            appl_origin_data: String::new(),
            group_id: [0u8; 24],
            msg_seq_number: 1,
            offset: 0,
            msg_flags: MQMF_NONE,
            original_length: MQOL_UNDEFINED,
        }
    }
}

impl Mqmd {
    /// Reset every field to its MQMD_DEFAULT value, keeping string buffers.
    pub fn reset(&mut self) {
        let Self {
            report,
            msg_type,
            expiry,
            feedback,
            encoding,
            coded_char_set_id,
            format,
            priority,
            persistence,
            msg_id,
            correl_id,
            backout_count,
            reply_to_q,
            reply_to_q_mgr,
            user_identifier,
            accounting_token,
            appl_identity_data,
            put_appl_type,
            put_appl_name,
            put_date,
            put_time,
            appl_origin_data,
            group_id,
            msg_seq_number,
            offset,
            msg_flags,
            original_length,
        } = self;
        *report = MQRO_NONE;
        *msg_type = MqMsgType::Datagram;
        *expiry = MQEI_UNLIMITED;
        *feedback = MQFB_NONE;
        *encoding = MQENC_NATIVE;
        *coded_char_set_id = MQCCSI_Q_MGR;
        format.clear();
        *priority = MqPriority::AsQueueDef;
        *persistence = MqPersistence::AsQueueDef;
        *msg_id = [0u8; 24];
        *correl_id = [0u8; 24];
        *backout_count = 0;
        reply_to_q.clear();
        reply_to_q_mgr.clear();
        user_identifier.clear();
        *accounting_token = [0u8; 32];
        appl_identity_data.clear();
        *put_appl_type = MQAT_NO_CONTEXT;
        put_appl_name.clear();
        put_date.clear();
        put_time.clear();
        appl_origin_data.clear();
        *group_id = [0u8; 24];
        *msg_seq_number = 1;
        *offset = 0;
        *msg_flags = MQMF_NONE;
        *original_length = MQOL_UNDEFINED;
    }
}

// ---------------------------------------------------------------------------
//  MQOD: Object Descriptor
// ---------------------------------------------------------------------------

/// MQOD: Object Descriptor (identifies a queue for open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mqod {
    /// Object type (MQOT_Q, MQOT_Q_MGR).
    pub object_type: i32,
    /// Object name (queue name).
    pub object_name: String,
    /// Queue manager name (blank = local).
    pub object_qmgr_name: String,
    /// Dynamic queue name template (for model queues).
    pub dynamic_q_name: String,
    /// Alternate user ID.
    pub alternate_user_id: String,
    /// Alternate security ID (up to 40 bytes).
    pub alternate_security_id: Vec<u8>,
    /// Resolved queue name (filled by MQOPEN).
    pub resolved_q_name: String,
    /// Resolved queue manager name.
    pub resolved_qmgr_name: String,
}

impl Default for Mqod {
    fn default() -> Self {
        Self {
            object_type: MQOT_Q,
            object_name: String::new(),
            object_qmgr_name: String::new(),
            dynamic_q_name: "AMQ.*".to_string(),
            alternate_user_id: String::new(),
            alternate_security_id: Vec::new(),
            resolved_q_name: String::new(),
            resolved_qmgr_name: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
//  MQGMO: Get Message Options
// ---------------------------------------------------------------------------

/// MQGMO: Get Message Options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mqgmo {
    /// MQGMO_* option bits.
    pub options: i32,
    /// Wait interval in milliseconds (MQWI_UNLIMITED = -1).
    pub wait_interval: i32,
    /// MQMO_* match options.
    pub match_options: i32,
    /// Resolved queue name (filled by MQGET).
    pub resolved_q_name: String,
}

impl Default for Mqgmo {
    fn default() -> Self {
        Self {
            options: MQGMO_NO_WAIT,
            wait_interval: 0,
            match_options: MQMO_NONE,
            resolved_q_name: String::new(),
        }
    }
}

impl Mqgmo {
    pub fn has(&self, option: i32) -> bool {
        self.options & option != 0
    }
}

// ---------------------------------------------------------------------------
//  MQPMO: Put Message Options
// ---------------------------------------------------------------------------

/// MQPMO: Put Message Options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MqPmo {
    /// MQPMO_* option bits.
    pub options: i32,
    /// Resolved queue name (filled by MQPUT).
    pub resolved_q_name: String,
    /// Resolved queue manager name.
    pub resolved_qmgr_name: String,
}

impl MqPmo {
    pub fn has(&self, option: i32) -> bool {
        self.options & option != 0
    }
}

// ---------------------------------------------------------------------------
//  MQDLH: Dead-Letter Header
// ---------------------------------------------------------------------------

/// Serialized length of an MQDLH version 1.
pub const MQDLH_LENGTH: usize = 172;

const MQDLH_STRUC_ID: &[u8; 4] = b"DLH ";

/// MQDLH: Dead-Letter Header prepended to undeliverable messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mqdlh {
    /// Reason message was put on DLQ.
    pub reason: i32,
    /// Original destination queue name.
    pub dest_q_name: String,
    /// Original destination queue manager name.
    pub dest_qmgr_name: String,
    /// Encoding of the data that follows the header.
    pub encoding: i32,
    /// CCSID of the data that follows the header.
    pub ccsid: i32,
    /// Format of the data that follows the header.
    pub format: String,
    /// Put application type.
    pub put_appl_type: i32,
    /// Put application name.
    pub put_appl_name: String,
    /// Date message was put on DLQ (YYYYMMDD).
    pub put_date: String,
    /// Time message was put on DLQ (HHMMSSTH).
    pub put_time: String,
}

impl Default for Mqdlh {
    fn default() -> Self {
        Self {
            reason: MQRC_NONE,
            dest_q_name: String::new(),
            dest_qmgr_name: String::new(),
            encoding: MQENC_NATIVE,
            ccsid: MQCCSI_Q_MGR,
            format: MQFMT_NONE.to_string(),
            put_appl_type: MQAT_NO_CONTEXT,
            put_appl_name: String::new(),
            put_date: String::new(),
            put_time: String::new(),
        }
    }
}

impl Mqdlh {
    /// Append the native-encoded header to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MQDLH_STRUC_ID);
        out.extend_from_slice(&1i32.to_ne_bytes());
        out.extend_from_slice(&self.reason.to_ne_bytes());
        put_fixed(out, &self.dest_q_name, 48);
        put_fixed(out, &self.dest_qmgr_name, 48);
        out.extend_from_slice(&self.encoding.to_ne_bytes());
        out.extend_from_slice(&self.ccsid.to_ne_bytes());
        put_fixed(out, &self.format, 8);
        out.extend_from_slice(&self.put_appl_type.to_ne_bytes());
        put_fixed(out, &self.put_appl_name, 28);
        put_fixed(out, &self.put_date, 8);
        put_fixed(out, &self.put_time, 8);
    }

    /// Parse a header from the front of `bytes`; `None` if it is not an MQDLH.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < MQDLH_LENGTH || &bytes[..4] != MQDLH_STRUC_ID {
            return None;
        }
        let int = |at: usize| i32::from_ne_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Some(Self {
            reason: int(8),
            dest_q_name: get_fixed(&bytes[12..60]),
            dest_qmgr_name: get_fixed(&bytes[60..108]),
            encoding: int(108),
            ccsid: int(112),
            format: get_fixed(&bytes[116..124]),
            put_appl_type: int(124),
            put_appl_name: get_fixed(&bytes[128..156]),
            put_date: get_fixed(&bytes[156..164]),
            put_time: get_fixed(&bytes[164..172]),
        })
    }
}

// ---------------------------------------------------------------------------
//  Fixed-width character fields
// ---------------------------------------------------------------------------

/// Append `value` blank-padded (or truncated) to exactly `width` bytes.
pub(crate) fn put_fixed(out: &mut Vec<u8>, value: &str, width: usize) {
    let start = out.len();
    out.resize(start + width, b' ');
    fill_fixed(&mut out[start..], value);
}

/// Copy `value` into `dst`, blank-padding the remainder.
pub(crate) fn fill_fixed(dst: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(dst.len());
    dst[..n].copy_from_slice(&bytes[..n]);
    dst[n..].fill(b' ');
}

/// Read a blank- or NUL-padded character field.
pub(crate) fn get_fixed(src: &[u8]) -> String {
    let end = src
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end])
        .trim_end_matches(' ')
        .to_string()
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
