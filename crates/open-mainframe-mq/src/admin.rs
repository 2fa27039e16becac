//! Administration: PCF commands executed through MQAI bags.
//!
//! A [`Command`] names a PCF command and carries typed parameters. The
//! transport turns it into an admin bag, runs it against the command server
//! and returns one [`ResponseItem`] per response bag.
//!
//! Command and selector names follow the MQ constant names in snake case,
//! so `MQCMD_INQUIRE_Q` is `inquire_q` and `MQIA_CURRENT_Q_DEPTH` is
//! `current_q_depth`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use crate::error::MqError;

// ---------------------------------------------------------------------------
//  Bag values
// ---------------------------------------------------------------------------

/// A typed bag item value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagValue {
    /// MQITEM_INTEGER.
    Integer(i32),
    /// MQITEM_STRING.
    String(String),
}

impl BagValue {
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Integer(_) => None,
        }
    }
}

impl From<i32> for BagValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for BagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for BagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ---------------------------------------------------------------------------
//  Selectors
// ---------------------------------------------------------------------------

/// A bag item selector (MQCA_*, MQIA_*, MQCACF_*, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector(pub i32);

impl Selector {
    pub const CURRENT_Q_DEPTH: Selector = Selector(3);
    pub const DEF_PERSISTENCE: Selector = Selector(5);
    pub const DEF_PRIORITY: Selector = Selector(6);
    pub const INHIBIT_GET: Selector = Selector(9);
    pub const INHIBIT_PUT: Selector = Selector(10);
    pub const USAGE: Selector = Selector(12);
    pub const MAX_MSG_LENGTH: Selector = Selector(13);
    pub const MAX_Q_DEPTH: Selector = Selector(15);
    pub const OPEN_INPUT_COUNT: Selector = Selector(17);
    pub const OPEN_OUTPUT_COUNT: Selector = Selector(18);
    pub const Q_TYPE: Selector = Selector(20);
    pub const BACKOUT_THRESHOLD: Selector = Selector(22);
    pub const SHAREABILITY: Selector = Selector(23);
    pub const TRIGGER_CONTROL: Selector = Selector(24);
    pub const Q_ATTRS: Selector = Selector(1002);
    pub const ALL: Selector = Selector(1009);
    pub const ESCAPE_TYPE: Selector = Selector(1017);
    pub const PURGE: Selector = Selector(1019);
    pub const REPLACE: Selector = Selector(1020);
    pub const CHANNEL_TYPE: Selector = Selector(1511);
    pub const BASE_Q_NAME: Selector = Selector(2002);
    pub const CREATION_DATE: Selector = Selector(2004);
    pub const CREATION_TIME: Selector = Selector(2005);
    pub const DEAD_LETTER_Q_NAME: Selector = Selector(2006);
    pub const INITIATION_Q_NAME: Selector = Selector(2008);
    pub const PROCESS_NAME: Selector = Selector(2012);
    pub const Q_DESC: Selector = Selector(2013);
    pub const Q_MGR_NAME: Selector = Selector(2015);
    pub const Q_NAME: Selector = Selector(2016);
    pub const REMOTE_Q_MGR_NAME: Selector = Selector(2017);
    pub const REMOTE_Q_NAME: Selector = Selector(2018);
    pub const BACKOUT_REQ_Q_NAME: Selector = Selector(2019);
    pub const XMIT_Q_NAME: Selector = Selector(2024);
    pub const ESCAPE_TEXT: Selector = Selector(3014);
    pub const CHANNEL_NAME: Selector = Selector(3501);
    pub const CONNECTION_NAME: Selector = Selector(3506);

    pub fn id(self) -> i32 {
        self.0
    }

    /// Snake-case name, if the selector is in the table.
    pub fn name(self) -> Option<&'static str> {
        SELECTOR_NAMES.get(&self).copied()
    }

    /// Look a selector up by its snake-case name.
    pub fn from_name(name: &str) -> Option<Selector> {
        SELECTORS_BY_NAME.get(name).copied()
    }

    /// System selectors (MQIASY_*) are negative.
    pub fn is_system(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "selector_{}", self.0),
        }
    }
}

const SELECTOR_TABLE: &[(&str, Selector)] = &[
    ("current_q_depth", Selector::CURRENT_Q_DEPTH),
    ("def_persistence", Selector::DEF_PERSISTENCE),
    ("def_priority", Selector::DEF_PRIORITY),
    ("inhibit_get", Selector::INHIBIT_GET),
    ("inhibit_put", Selector::INHIBIT_PUT),
    ("usage", Selector::USAGE),
    ("max_msg_length", Selector::MAX_MSG_LENGTH),
    ("max_q_depth", Selector::MAX_Q_DEPTH),
    ("open_input_count", Selector::OPEN_INPUT_COUNT),
    ("open_output_count", Selector::OPEN_OUTPUT_COUNT),
    ("q_type", Selector::Q_TYPE),
    ("backout_threshold", Selector::BACKOUT_THRESHOLD),
    ("shareability", Selector::SHAREABILITY),
    ("trigger_control", Selector::TRIGGER_CONTROL),
    ("q_attrs", Selector::Q_ATTRS),
    ("all", Selector::ALL),
    ("escape_type", Selector::ESCAPE_TYPE),
    ("purge", Selector::PURGE),
    ("replace", Selector::REPLACE),
    ("channel_type", Selector::CHANNEL_TYPE),
    ("base_q_name", Selector::BASE_Q_NAME),
    ("creation_date", Selector::CREATION_DATE),
    ("creation_time", Selector::CREATION_TIME),
    ("dead_letter_q_name", Selector::DEAD_LETTER_Q_NAME),
    ("initiation_q_name", Selector::INITIATION_Q_NAME),
    ("process_name", Selector::PROCESS_NAME),
    ("q_desc", Selector::Q_DESC),
    ("q_mgr_name", Selector::Q_MGR_NAME),
    ("q_name", Selector::Q_NAME),
    ("remote_q_mgr_name", Selector::REMOTE_Q_MGR_NAME),
    ("remote_q_name", Selector::REMOTE_Q_NAME),
    ("backout_req_q_name", Selector::BACKOUT_REQ_Q_NAME),
    ("xmit_q_name", Selector::XMIT_Q_NAME),
    ("escape_text", Selector::ESCAPE_TEXT),
    ("channel_name", Selector::CHANNEL_NAME),
    ("connection_name", Selector::CONNECTION_NAME),
];

static SELECTORS_BY_NAME: LazyLock<HashMap<&'static str, Selector>> =
    LazyLock::new(|| SELECTOR_TABLE.iter().copied().collect());

static SELECTOR_NAMES: LazyLock<HashMap<Selector, &'static str>> =
    LazyLock::new(|| SELECTOR_TABLE.iter().map(|&(n, s)| (s, n)).collect());

// ---------------------------------------------------------------------------
//  Commands
// ---------------------------------------------------------------------------

/// PCF command identifiers (MQCMD_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    ChangeQMgr,
    InquireQMgr,
    ChangeQ,
    ClearQ,
    CopyQ,
    CreateQ,
    DeleteQ,
    InquireQ,
    ResetQStats,
    InquireQNames,
    InquireChannelNames,
    ChangeChannel,
    CreateChannel,
    DeleteChannel,
    InquireChannel,
    PingChannel,
    StartChannel,
    StopChannel,
    Escape,
    PingQMgr,
    InquireQStatus,
    InquireChannelStatus,
}

const COMMAND_TABLE: &[(CommandCode, &str, i32)] = &[
    (CommandCode::ChangeQMgr, "change_q_mgr", 1),
    (CommandCode::InquireQMgr, "inquire_q_mgr", 2),
    (CommandCode::ChangeQ, "change_q", 8),
    (CommandCode::ClearQ, "clear_q", 9),
    (CommandCode::CopyQ, "copy_q", 10),
    (CommandCode::CreateQ, "create_q", 11),
    (CommandCode::DeleteQ, "delete_q", 12),
    (CommandCode::InquireQ, "inquire_q", 13),
    (CommandCode::ResetQStats, "reset_q_stats", 17),
    (CommandCode::InquireQNames, "inquire_q_names", 18),
    (CommandCode::InquireChannelNames, "inquire_channel_names", 20),
    (CommandCode::ChangeChannel, "change_channel", 21),
    (CommandCode::CreateChannel, "create_channel", 23),
    (CommandCode::DeleteChannel, "delete_channel", 24),
    (CommandCode::InquireChannel, "inquire_channel", 25),
    (CommandCode::PingChannel, "ping_channel", 26),
    (CommandCode::StartChannel, "start_channel", 28),
    (CommandCode::StopChannel, "stop_channel", 29),
    (CommandCode::Escape, "escape", 38),
    (CommandCode::PingQMgr, "ping_q_mgr", 40),
    (CommandCode::InquireQStatus, "inquire_q_status", 41),
    (CommandCode::InquireChannelStatus, "inquire_channel_status", 42),
];

static COMMANDS_BY_NAME: LazyLock<HashMap<&'static str, CommandCode>> =
    LazyLock::new(|| COMMAND_TABLE.iter().map(|&(c, n, _)| (n, c)).collect());

static COMMAND_INFO: LazyLock<HashMap<CommandCode, (&'static str, i32)>> =
    LazyLock::new(|| COMMAND_TABLE.iter().map(|&(c, n, id)| (c, (n, id))).collect());

impl CommandCode {
    /// Numeric MQCMD_* value.
    pub fn id(self) -> i32 {
        COMMAND_INFO.get(&self).map(|&(_, id)| id).unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        COMMAND_INFO.get(&self).map(|&(n, _)| n).unwrap_or_default()
    }

    pub fn from_name(name: &str) -> Option<CommandCode> {
        COMMANDS_BY_NAME.get(name).copied()
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A PCF command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub code: CommandCode,
    /// Integer and string parameters, added in order.
    pub parameters: Vec<(Selector, BagValue)>,
    /// Attributes to return (added with mqAddInquiry).
    pub inquiries: Vec<Selector>,
}

/// One response bag, keyed by selector.
pub type ResponseItem = BTreeMap<Selector, BagValue>;

impl Command {
    pub fn new(code: CommandCode) -> Self {
        Self {
            code,
            parameters: Vec::new(),
            inquiries: Vec::new(),
        }
    }

    /// Add a parameter.
    pub fn with(mut self, selector: Selector, value: impl Into<BagValue>) -> Self {
        self.parameters.push((selector, value.into()));
        self
    }

    /// Ask for an attribute in the response.
    pub fn inquire(mut self, selector: Selector) -> Self {
        self.inquiries.push(selector);
        self
    }

    /// Build a command from names, e.g. `("inquire_q", [("q_name", "APP.*")])`.
    pub fn from_names<'a, I>(command: &str, parameters: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (&'a str, BagValue)>,
    {
        let code = CommandCode::from_name(command).ok_or_else(|| MqError::InvalidField {
            field: command.to_string(),
            reason: "unknown command".into(),
        })?;
        let mut cmd = Self::new(code);
        for (name, value) in parameters {
            let selector = Selector::from_name(name).ok_or_else(|| MqError::InvalidField {
                field: name.to_string(),
                reason: format!("unknown selector for command {code}"),
            })?;
            cmd.parameters.push((selector, value));
        }
        Ok(cmd)
    }

    /// Value of a parameter, if present.
    pub fn parameter(&self, selector: Selector) -> Option<&BagValue> {
        self.parameters
            .iter()
            .find(|(s, _)| *s == selector)
            .map(|(_, v)| v)
    }
}
