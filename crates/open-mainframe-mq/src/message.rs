//! Messages: payload, descriptor and headers.
//!
//! A [`Message`] is what `put` sends and what `get` fills in. Headers are
//! kept apart from the payload; on put they are serialised in front of the
//! data and the descriptor format is chained through them, and on get a
//! leading dead-letter header is parsed back out.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::MqError;
use crate::structures::{MqMsgType, MqPersistence, MqPriority, Mqdlh, Mqmd, MQDLH_LENGTH};

// ---------------------------------------------------------------------------
//  Headers
// ---------------------------------------------------------------------------

/// A header carried in front of the message data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Header {
    /// MQDLH.
    DeadLetter(Mqdlh),
}

impl Header {
    /// MQFMT_* name identifying this header in the preceding format field.
    pub fn format(&self) -> &'static str {
        match self {
            Self::DeadLetter(_) => MQFMT_DEAD_LETTER_HEADER,
        }
    }
}

// ---------------------------------------------------------------------------
//  Field values
// ---------------------------------------------------------------------------

/// A value for [`Message::from_fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i32),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Data,
    Report,
    MsgType,
    Expiry,
    Feedback,
    Encoding,
    CodedCharSetId,
    Format,
    Priority,
    Persistence,
    MsgId,
    CorrelId,
    BackoutCount,
    ReplyToQ,
    ReplyToQMgr,
    UserIdentifier,
    AccountingToken,
    ApplIdentityData,
    PutApplType,
    PutApplName,
    PutDate,
    PutTime,
    ApplOriginData,
    GroupId,
    MsgSeqNumber,
    Offset,
    MsgFlags,
    OriginalLength,
}

const FIELD_TABLE: &[(&str, Field)] = &[
    ("data", Field::Data),
    ("report", Field::Report),
    ("msg_type", Field::MsgType),
    ("expiry", Field::Expiry),
    ("feedback", Field::Feedback),
    ("encoding", Field::Encoding),
    ("coded_char_set_id", Field::CodedCharSetId),
    ("format", Field::Format),
    ("priority", Field::Priority),
    ("persistence", Field::Persistence),
    ("msg_id", Field::MsgId),
    ("correl_id", Field::CorrelId),
    ("backout_count", Field::BackoutCount),
    ("reply_to_q", Field::ReplyToQ),
    ("reply_to_q_mgr", Field::ReplyToQMgr),
    ("user_identifier", Field::UserIdentifier),
    ("accounting_token", Field::AccountingToken),
    ("appl_identity_data", Field::ApplIdentityData),
    ("put_appl_type", Field::PutApplType),
    ("put_appl_name", Field::PutApplName),
    ("put_date", Field::PutDate),
    ("put_time", Field::PutTime),
    ("appl_origin_data", Field::ApplOriginData),
    ("group_id", Field::GroupId),
    ("msg_seq_number", Field::MsgSeqNumber),
    ("offset", Field::Offset),
    ("msg_flags", Field::MsgFlags),
    ("original_length", Field::OriginalLength),
];

static FIELDS: LazyLock<HashMap<&'static str, Field>> =
    LazyLock::new(|| FIELD_TABLE.iter().copied().collect());

fn fixed_bytes<const N: usize>(value: FieldValue) -> Result<[u8; N], String> {
    let bytes = match value {
        FieldValue::Bytes(bytes) => bytes,
        FieldValue::Text(text) => text.into_bytes(),
        _ => return Err("expected bytes".into()),
    };
    if bytes.len() > N {
        return Err(format!("at most {N} bytes allowed, got {}", bytes.len()));
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(&bytes);
    Ok(out)
}

// ---------------------------------------------------------------------------
//  Message
// ---------------------------------------------------------------------------

/// A message: payload bytes, descriptor (MQMD) and headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Application data, without headers.
    pub data: Vec<u8>,
    pub descriptor: Mqmd,
    /// Headers in the order they precede the data.
    pub headers: Vec<Header>,
}

impl Message {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Build a message from named descriptor fields layered over the
    /// defaults. `data` sets the payload.
    ///
    /// ```
    /// use open_mainframe_mq::Message;
    ///
    /// let msg = Message::from_fields([
    ///     ("data", "hello".into()),
    ///     ("persistence", true.into()),
    ///     ("reply_to_q", "APP.REPLY".into()),
    /// ])
    /// .unwrap();
    /// assert_eq!(msg.descriptor.reply_to_q, "APP.REPLY");
    /// ```
    pub fn from_fields<'a, I>(fields: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (&'a str, FieldValue)>,
    {
        let mut message = Self::default();
        for (name, value) in fields {
            let field = FIELDS.get(name).copied().ok_or_else(|| MqError::InvalidField {
                field: name.to_string(),
                reason: "unknown message field".into(),
            })?;
            message.apply(field, value).map_err(|reason| MqError::InvalidField {
                field: name.to_string(),
                reason,
            })?;
        }
        Ok(message)
    }

    fn apply(&mut self, field: Field, value: FieldValue) -> Result<(), String> {
        use FieldValue::{Bool, Bytes, Integer, Text};

        let md = &mut self.descriptor;
        match (field, value) {
            (Field::Data, Bytes(bytes)) => self.data = bytes,
            (Field::Data, Text(text)) => self.data = text.into_bytes(),
            (Field::Report, Integer(v)) => md.report = v,
            (Field::MsgType, Integer(v)) => md.msg_type = MqMsgType::from_raw(v),
            (Field::Expiry, Integer(v)) => md.expiry = v,
            (Field::Feedback, Integer(v)) => md.feedback = v,
            (Field::Encoding, Integer(v)) => md.encoding = v,
            (Field::CodedCharSetId, Integer(v)) => md.coded_char_set_id = v,
            (Field::Format, Text(v)) => md.format = v,
            (Field::Priority, Integer(v)) => md.priority = MqPriority::from_raw(v),
            (Field::Persistence, Bool(v)) => md.persistence = MqPersistence::from(v),
            (Field::Persistence, Integer(v)) => md.persistence = MqPersistence::from_raw(v),
            (Field::MsgId, v) => md.msg_id = fixed_bytes(v)?,
            (Field::CorrelId, v) => md.correl_id = fixed_bytes(v)?,
            (Field::GroupId, v) => md.group_id = fixed_bytes(v)?,
            (Field::AccountingToken, v) => md.accounting_token = fixed_bytes(v)?,
            (Field::BackoutCount, Integer(v)) => md.backout_count = v,
            (Field::ReplyToQ, Text(v)) => md.reply_to_q = v,
            (Field::ReplyToQMgr, Text(v)) => md.reply_to_q_mgr = v,
            (Field::UserIdentifier, Text(v)) => md.user_identifier = v,
            (Field::ApplIdentityData, Text(v)) => md.appl_identity_data = v,
            (Field::PutApplType, Integer(v)) => md.put_appl_type = v,
            (Field::PutApplName, Text(v)) => md.put_appl_name = v,
            (Field::PutDate, Text(v)) => md.put_date = v,
            (Field::PutTime, Text(v)) => md.put_time = v,
            (Field::ApplOriginData, Text(v)) => md.appl_origin_data = v,
            (Field::MsgSeqNumber, Integer(v)) => md.msg_seq_number = v,
            (Field::Offset, Integer(v)) => md.offset = v,
            (Field::MsgFlags, Integer(v)) => md.msg_flags = v,
            (Field::OriginalLength, Integer(v)) => md.original_length = v,
            (_, value) => return Err(format!("value of the wrong kind: {value:?}")),
        }
        Ok(())
    }

    /// Reset payload, headers and descriptor to their defaults, keeping the
    /// payload allocation.
    pub fn clear(&mut self) {
        self.data.clear();
        self.headers.clear();
        self.descriptor.reset();
    }

    /// Payload as UTF-8 text, if it is valid.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// When the message was put, from `put_date` and `put_time`.
    pub fn put_timestamp(&self) -> Option<NaiveDateTime> {
        let md = &self.descriptor;
        let date = NaiveDate::parse_from_str(&md.put_date, "%Y%m%d").ok()?;
        let time = NaiveTime::parse_from_str(md.put_time.get(..6)?, "%H%M%S").ok()?;
        let hundredths: u32 = match md.put_time.get(6..8) {
            Some(digits) => digits.parse().ok()?,
            None => 0,
        };
        let time = time.with_nanosecond(hundredths * 10_000_000)?;
        Some(date.and_time(time))
    }

    /// Descriptor and body as they go to the queue manager.
    pub(crate) fn to_wire(&self) -> (Mqmd, Cow<'_, [u8]>) {
        let mut md = self.descriptor.clone();
        if self.headers.is_empty() {
            return (md, Cow::Borrowed(&self.data));
        }

        let mut body = Vec::with_capacity(self.headers.len() * MQDLH_LENGTH + self.data.len());
        let mut next = (
            self.descriptor.format.clone(),
            self.descriptor.encoding,
            self.descriptor.coded_char_set_id,
        );
        let mut chained = Vec::with_capacity(self.headers.len());
        for header in self.headers.iter().rev() {
            match header {
                Header::DeadLetter(dlh) => {
                    let mut dlh = dlh.clone();
                    (dlh.format, dlh.encoding, dlh.ccsid) = next;
                    next = (header.format().to_string(), MQENC_NATIVE, self.descriptor.coded_char_set_id);
                    chained.push(dlh);
                }
            }
        }
        for dlh in chained.iter().rev() {
            dlh.encode(&mut body);
        }
        body.extend_from_slice(&self.data);
        (md.format, md.encoding, md.coded_char_set_id) = next;
        (md, Cow::Owned(body))
    }

    /// Take the descriptor returned by a put, keeping the data format
    /// fields that `to_wire` replaced with header formats.
    pub(crate) fn accept_put_descriptor(&mut self, mut md: Mqmd) {
        md.format = std::mem::take(&mut self.descriptor.format);
        md.encoding = self.descriptor.encoding;
        md.coded_char_set_id = self.descriptor.coded_char_set_id;
        self.descriptor = md;
    }

    /// Move leading headers out of the received data.
    pub(crate) fn take_headers(&mut self) {
        self.headers.clear();
        let mut offset = 0;
        while self.descriptor.format == MQFMT_DEAD_LETTER_HEADER {
            let Some(dlh) = Mqdlh::decode(&self.data[offset..]) else {
                break;
            };
            offset += MQDLH_LENGTH;
            self.descriptor.format = dlh.format.clone();
            self.descriptor.encoding = dlh.encoding;
            self.descriptor.coded_char_set_id = dlh.ccsid;
            self.headers.push(Header::DeadLetter(dlh));
        }
        self.data.drain(..offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields() {
        let msg = Message::from_fields([
            ("data", "hello".into()),
            ("persistence", true.into()),
            ("priority", 7.into()),
            ("msg_type", MQMT_REQUEST.into()),
            ("correl_id", b"ABC".as_slice().into()),
            ("format", MQFMT_STRING.into()),
        ])
        .unwrap();
        assert_eq!(msg.data, b"hello");
        assert_eq!(msg.descriptor.persistence, MqPersistence::Persistent);
        assert_eq!(msg.descriptor.priority, MqPriority::Priority(7));
        assert_eq!(msg.descriptor.msg_type, MqMsgType::Request);
        assert_eq!(&msg.descriptor.correl_id[..4], b"ABC\0");
        assert_eq!(msg.descriptor.expiry, MQEI_UNLIMITED);
    }

    #[test]
    fn test_from_fields_rejects_unknown_and_ill_typed() {
        let err = Message::from_fields([("colour", "red".into())]).unwrap_err();
        assert!(matches!(err, MqError::InvalidField { ref field, .. } if field == "colour"));

        let err = Message::from_fields([("expiry", "soon".into())]).unwrap_err();
        assert!(matches!(err, MqError::InvalidField { ref field, .. } if field == "expiry"));

        let long = vec![1u8; 25];
        assert!(Message::from_fields([("msg_id", long.into())]).is_err());
    }

    #[test]
    fn test_clear_restores_defaults() {
        let mut msg = Message::from_fields([
            ("data", "payload".into()),
            ("reply_to_q", "REPLY.Q".into()),
            ("backout_count", 2.into()),
        ])
        .unwrap();
        msg.headers.push(Header::DeadLetter(Mqdlh::default()));
        let capacity = msg.data.capacity();

        msg.clear();
        assert_eq!(msg, Message::default());
        assert_eq!(msg.data.capacity(), capacity);
    }

    #[test]
    fn test_put_timestamp() {
        let mut msg = Message::default();
        assert!(msg.put_timestamp().is_none());
        msg.descriptor.put_date = "20240229".into();
        msg.descriptor.put_time = "13450712".into();
        let ts = msg.put_timestamp().unwrap();
        assert_eq!(ts.to_string(), "2024-02-29 13:45:07.120");
    }

    #[test]
    fn test_dead_letter_header_on_the_wire() {
        let mut msg = Message::new("body");
        msg.descriptor.format = MQFMT_STRING.into();
        msg.headers.push(Header::DeadLetter(Mqdlh {
            reason: MQRC_UNKNOWN_OBJECT_NAME,
            dest_q_name: "LOST.Q".into(),
            ..Default::default()
        }));

        let (md, body) = msg.to_wire();
        assert_eq!(md.format, MQFMT_DEAD_LETTER_HEADER);
        assert_eq!(body.len(), MQDLH_LENGTH + 4);

        let mut received = Message {
            data: body.into_owned(),
            descriptor: md,
            headers: Vec::new(),
        };
        received.take_headers();
        assert_eq!(received.data, b"body");
        assert_eq!(received.descriptor.format, MQFMT_STRING);
        let Header::DeadLetter(dlh) = &received.headers[0];
        assert_eq!(dlh.dest_q_name, "LOST.Q");
        assert_eq!(dlh.format, MQFMT_STRING);
    }

    #[test]
    fn test_plain_body_is_borrowed() {
        let msg = Message::new("plain");
        let (_, body) = msg.to_wire();
        assert!(matches!(body, Cow::Borrowed(_)));
        assert_eq!(&*body, b"plain");
    }
}
