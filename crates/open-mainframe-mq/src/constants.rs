//! MQI constants: completion/reason codes, open/get/put options, MQMD values.
//!
//! Values match the published `cmqc.h` definitions so they can be passed to
//! the MQ library unchanged.

use std::collections::HashMap;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
//  Completion codes
// ---------------------------------------------------------------------------

pub const MQCC_OK: i32 = 0;
pub const MQCC_WARNING: i32 = 1;
pub const MQCC_FAILED: i32 = 2;
pub const MQCC_UNKNOWN: i32 = -1;

// ---------------------------------------------------------------------------
//  Reason codes
// ---------------------------------------------------------------------------

pub const MQRC_NONE: i32 = 0;
pub const MQRC_ALREADY_CONNECTED: i32 = 2002;
pub const MQRC_BACKED_OUT: i32 = 2003;
pub const MQRC_BUFFER_LENGTH_ERROR: i32 = 2005;
pub const MQRC_CONNECTION_BROKEN: i32 = 2009;
pub const MQRC_DATA_LENGTH_ERROR: i32 = 2010;
pub const MQRC_DYNAMIC_Q_NAME_ERROR: i32 = 2011;
pub const MQRC_ENVIRONMENT_ERROR: i32 = 2012;
pub const MQRC_GET_INHIBITED: i32 = 2016;
pub const MQRC_HANDLE_NOT_AVAILABLE: i32 = 2017;
pub const MQRC_HCONN_ERROR: i32 = 2018;
pub const MQRC_HOBJ_ERROR: i32 = 2019;
pub const MQRC_INHIBIT_VALUE_ERROR: i32 = 2020;
pub const MQRC_INT_ATTR_COUNT_ERROR: i32 = 2021;
pub const MQRC_MD_ERROR: i32 = 2026;
pub const MQRC_MISSING_REPLY_TO_Q: i32 = 2027;
pub const MQRC_MSG_TOO_BIG_FOR_Q: i32 = 2030;
pub const MQRC_NO_MSG_AVAILABLE: i32 = 2033;
pub const MQRC_NO_MSG_UNDER_CURSOR: i32 = 2034;
pub const MQRC_NOT_AUTHORIZED: i32 = 2035;
pub const MQRC_NOT_OPEN_FOR_BROWSE: i32 = 2036;
pub const MQRC_NOT_OPEN_FOR_INPUT: i32 = 2037;
pub const MQRC_NOT_OPEN_FOR_INQUIRE: i32 = 2038;
pub const MQRC_NOT_OPEN_FOR_OUTPUT: i32 = 2039;
pub const MQRC_NOT_OPEN_FOR_SET: i32 = 2040;
pub const MQRC_OBJECT_IN_USE: i32 = 2042;
pub const MQRC_OBJECT_TYPE_ERROR: i32 = 2043;
pub const MQRC_OD_ERROR: i32 = 2044;
pub const MQRC_OPTIONS_ERROR: i32 = 2046;
pub const MQRC_PERSISTENCE_ERROR: i32 = 2047;
pub const MQRC_PRIORITY_ERROR: i32 = 2050;
pub const MQRC_PUT_INHIBITED: i32 = 2051;
pub const MQRC_Q_FULL: i32 = 2053;
pub const MQRC_Q_NOT_EMPTY: i32 = 2055;
pub const MQRC_Q_TYPE_ERROR: i32 = 2057;
pub const MQRC_Q_MGR_NAME_ERROR: i32 = 2058;
pub const MQRC_Q_MGR_NOT_AVAILABLE: i32 = 2059;
pub const MQRC_SECURITY_ERROR: i32 = 2063;
pub const MQRC_SELECTOR_ERROR: i32 = 2067;
pub const MQRC_SYNCPOINT_NOT_AVAILABLE: i32 = 2072;
pub const MQRC_TRUNCATED_MSG_ACCEPTED: i32 = 2079;
pub const MQRC_TRUNCATED_MSG_FAILED: i32 = 2080;
pub const MQRC_UNKNOWN_OBJECT_NAME: i32 = 2085;
pub const MQRC_UNKNOWN_OBJECT_Q_MGR: i32 = 2086;
pub const MQRC_UNKNOWN_REMOTE_Q_MGR: i32 = 2087;
pub const MQRC_OBJECT_ALREADY_EXISTS: i32 = 2100;
pub const MQRC_OBJECT_DAMAGED: i32 = 2101;
pub const MQRC_FORMAT_ERROR: i32 = 2110;
pub const MQRC_NOT_CONVERTED: i32 = 2119;
pub const MQRC_NO_EXTERNAL_PARTICIPANTS: i32 = 2121;
pub const MQRC_OUTCOME_MIXED: i32 = 2123;
pub const MQRC_CNO_ERROR: i32 = 2139;
pub const MQRC_Q_MGR_QUIESCING: i32 = 2161;
pub const MQRC_Q_MGR_STOPPING: i32 = 2162;
pub const MQRC_UNEXPECTED_ERROR: i32 = 2195;
pub const MQRC_CONNECTION_QUIESCING: i32 = 2202;
pub const MQRC_CONNECTION_STOPPING: i32 = 2203;
pub const MQRC_CALL_IN_PROGRESS: i32 = 2219;
pub const MQRC_CD_ERROR: i32 = 2277;
pub const MQRC_KEY_REPOSITORY_ERROR: i32 = 2381;
pub const MQRC_SSL_INITIALIZATION_ERROR: i32 = 2393;
pub const MQRC_CHANNEL_NOT_AVAILABLE: i32 = 2537;
pub const MQRC_HOST_NOT_AVAILABLE: i32 = 2538;
pub const MQRC_UNKNOWN_CHANNEL_NAME: i32 = 2540;
pub const MQRCCF_COMMAND_FAILED: i32 = 3008;
pub const MQRCCF_ESCAPE_TYPE_ERROR: i32 = 3041;
pub const MQRCCF_MQSC_COMMAND_ERROR: i32 = 3022;
pub const MQRCCF_COMMAND_INHIBITED: i32 = 3231;

// ---------------------------------------------------------------------------
//  Handles
// ---------------------------------------------------------------------------

pub const MQHC_UNUSABLE_HCONN: i32 = -1;
pub const MQHO_NONE: i32 = 0;
pub const MQHO_UNUSABLE_HOBJ: i32 = -1;

// ---------------------------------------------------------------------------
//  Open / close options (MQOO_*, MQCO_*)
// ---------------------------------------------------------------------------

pub const MQOO_BIND_AS_Q_DEF: i32 = 0x0000_0000;
pub const MQOO_INPUT_AS_Q_DEF: i32 = 0x0000_0001;
pub const MQOO_INPUT_SHARED: i32 = 0x0000_0002;
pub const MQOO_INPUT_EXCLUSIVE: i32 = 0x0000_0004;
pub const MQOO_BROWSE: i32 = 0x0000_0008;
pub const MQOO_OUTPUT: i32 = 0x0000_0010;
pub const MQOO_INQUIRE: i32 = 0x0000_0020;
pub const MQOO_SET: i32 = 0x0000_0040;
pub const MQOO_SAVE_ALL_CONTEXT: i32 = 0x0000_0080;
pub const MQOO_PASS_IDENTITY_CONTEXT: i32 = 0x0000_0100;
pub const MQOO_PASS_ALL_CONTEXT: i32 = 0x0000_0200;
pub const MQOO_SET_IDENTITY_CONTEXT: i32 = 0x0000_0400;
pub const MQOO_SET_ALL_CONTEXT: i32 = 0x0000_0800;
pub const MQOO_ALTERNATE_USER_AUTHORITY: i32 = 0x0000_1000;
pub const MQOO_FAIL_IF_QUIESCING: i32 = 0x0000_2000;
pub const MQOO_BIND_ON_OPEN: i32 = 0x0000_4000;
pub const MQOO_BIND_NOT_FIXED: i32 = 0x0000_8000;

/// Any of the options that open a queue for destructive input.
pub const MQOO_INPUT_ANY: i32 = MQOO_INPUT_AS_Q_DEF | MQOO_INPUT_SHARED | MQOO_INPUT_EXCLUSIVE;

pub const MQCO_NONE: i32 = 0;
pub const MQCO_DELETE: i32 = 1;
pub const MQCO_DELETE_PURGE: i32 = 2;

// ---------------------------------------------------------------------------
//  Object types
// ---------------------------------------------------------------------------

pub const MQOT_Q: i32 = 1;
pub const MQOT_Q_MGR: i32 = 5;

// ---------------------------------------------------------------------------
//  Get message options (MQGMO_*, MQMO_*, MQWI_*)
// ---------------------------------------------------------------------------

pub const MQGMO_NO_WAIT: i32 = 0x0000_0000;
pub const MQGMO_WAIT: i32 = 0x0000_0001;
pub const MQGMO_SYNCPOINT: i32 = 0x0000_0002;
pub const MQGMO_NO_SYNCPOINT: i32 = 0x0000_0004;
pub const MQGMO_BROWSE_FIRST: i32 = 0x0000_0010;
pub const MQGMO_BROWSE_NEXT: i32 = 0x0000_0020;
pub const MQGMO_ACCEPT_TRUNCATED_MSG: i32 = 0x0000_0040;
pub const MQGMO_MSG_UNDER_CURSOR: i32 = 0x0000_0100;
pub const MQGMO_SYNCPOINT_IF_PERSISTENT: i32 = 0x0000_1000;
pub const MQGMO_FAIL_IF_QUIESCING: i32 = 0x0000_2000;
pub const MQGMO_CONVERT: i32 = 0x0000_4000;

pub const MQWI_UNLIMITED: i32 = -1;

pub const MQMO_NONE: i32 = 0x0000_0000;
pub const MQMO_MATCH_MSG_ID: i32 = 0x0000_0001;
pub const MQMO_MATCH_CORREL_ID: i32 = 0x0000_0002;

// ---------------------------------------------------------------------------
//  Put message options (MQPMO_*)
// ---------------------------------------------------------------------------

pub const MQPMO_NONE: i32 = 0x0000_0000;
pub const MQPMO_SYNCPOINT: i32 = 0x0000_0002;
pub const MQPMO_NO_SYNCPOINT: i32 = 0x0000_0004;
pub const MQPMO_DEFAULT_CONTEXT: i32 = 0x0000_0020;
pub const MQPMO_NEW_MSG_ID: i32 = 0x0000_0040;
pub const MQPMO_NEW_CORREL_ID: i32 = 0x0000_0080;
pub const MQPMO_PASS_IDENTITY_CONTEXT: i32 = 0x0000_0100;
pub const MQPMO_PASS_ALL_CONTEXT: i32 = 0x0000_0200;
pub const MQPMO_SET_IDENTITY_CONTEXT: i32 = 0x0000_0400;
pub const MQPMO_SET_ALL_CONTEXT: i32 = 0x0000_0800;
pub const MQPMO_FAIL_IF_QUIESCING: i32 = 0x0000_2000;
pub const MQPMO_NO_CONTEXT: i32 = 0x0000_4000;

// ---------------------------------------------------------------------------
//  Message descriptor values
// ---------------------------------------------------------------------------

pub const MQMT_REQUEST: i32 = 1;
pub const MQMT_REPLY: i32 = 2;
pub const MQMT_REPORT: i32 = 4;
pub const MQMT_DATAGRAM: i32 = 8;

pub const MQPER_NOT_PERSISTENT: i32 = 0;
pub const MQPER_PERSISTENT: i32 = 1;
pub const MQPER_PERSISTENCE_AS_Q_DEF: i32 = 2;

pub const MQPRI_PRIORITY_AS_Q_DEF: i32 = -1;

pub const MQEI_UNLIMITED: i32 = -1;

pub const MQRO_NONE: i32 = 0x0000_0000;
pub const MQRO_PASS_CORREL_ID: i32 = 0x0000_0040;
pub const MQRO_PASS_MSG_ID: i32 = 0x0000_0080;

pub const MQFB_NONE: i32 = 0;

#[cfg(target_endian = "little")]
pub const MQENC_NATIVE: i32 = 0x0000_0222;
#[cfg(target_endian = "big")]
pub const MQENC_NATIVE: i32 = 0x0000_0111;

pub const MQCCSI_Q_MGR: i32 = 0;

pub const MQAT_NO_CONTEXT: i32 = 0;
pub const MQMF_NONE: i32 = 0;
pub const MQOL_UNDEFINED: i32 = -1;

pub const MQFMT_NONE: &str = "";
pub const MQFMT_STRING: &str = "MQSTR";
pub const MQFMT_ADMIN: &str = "MQADMIN";
pub const MQFMT_DEAD_LETTER_HEADER: &str = "MQDEAD";

/// Default dead-letter queue name.
pub const SYSTEM_DEAD_LETTER_QUEUE: &str = "SYSTEM.DEAD.LETTER.QUEUE";

// ---------------------------------------------------------------------------
//  Connection options (MQCNO_*, MQXPT_*, MQCSP_*)
// ---------------------------------------------------------------------------

pub const MQCNO_NONE: i32 = 0x0000_0000;
pub const MQCNO_STANDARD_BINDING: i32 = 0x0000_0000;
pub const MQCNO_FASTPATH_BINDING: i32 = 0x0000_0001;
pub const MQCNO_SHARED_BINDING: i32 = 0x0000_0100;
pub const MQCNO_ISOLATED_BINDING: i32 = 0x0000_0200;

pub const MQXPT_LOCAL: i32 = 0;
pub const MQXPT_LU62: i32 = 1;
pub const MQXPT_TCP: i32 = 2;
pub const MQXPT_NETBIOS: i32 = 3;
pub const MQXPT_SPX: i32 = 4;
pub const MQXPT_UDP: i32 = 6;

pub const MQCHT_CLNTCONN: i32 = 6;

pub const MQCSP_AUTH_NONE: i32 = 0;
pub const MQCSP_AUTH_USER_ID_AND_PWD: i32 = 1;

// ---------------------------------------------------------------------------
//  Queue attributes (MQIA_*, MQQA_*, MQQT_*)
// ---------------------------------------------------------------------------

pub const MQIA_CURRENT_Q_DEPTH: i32 = 3;
pub const MQIA_DEF_PERSISTENCE: i32 = 5;
pub const MQIA_DEF_PRIORITY: i32 = 6;
pub const MQIA_INHIBIT_GET: i32 = 9;
pub const MQIA_INHIBIT_PUT: i32 = 10;
pub const MQIA_MAX_MSG_LENGTH: i32 = 13;
pub const MQIA_MAX_Q_DEPTH: i32 = 15;
pub const MQIA_OPEN_INPUT_COUNT: i32 = 17;
pub const MQIA_OPEN_OUTPUT_COUNT: i32 = 18;
pub const MQIA_Q_TYPE: i32 = 20;

pub const MQQA_GET_ALLOWED: i32 = 0;
pub const MQQA_GET_INHIBITED: i32 = 1;
pub const MQQA_PUT_ALLOWED: i32 = 0;
pub const MQQA_PUT_INHIBITED: i32 = 1;

pub const MQQT_LOCAL: i32 = 1;
pub const MQQT_MODEL: i32 = 2;
pub const MQQT_ALIAS: i32 = 3;
pub const MQQT_REMOTE: i32 = 6;
pub const MQQT_ALL: i32 = 1001;

pub const MQET_MQSC: i32 = 1;

// ---------------------------------------------------------------------------
//  Administration bags (MQCBO_*, MQHA_*, MQSEL_*, MQITEM_*)
// ---------------------------------------------------------------------------

pub const MQCBO_ADMIN_BAG: i32 = 0x0000_0001;
pub const MQHB_NONE: i32 = -2;
pub const MQHB_UNUSABLE_HBAG: i32 = -1;
pub const MQHA_BAG_HANDLE: i32 = 4001;
pub const MQSEL_ALL_SELECTORS: i32 = -30001;
pub const MQSEL_ANY_SELECTOR: i32 = -30001;
pub const MQITEM_INTEGER: i32 = 1;
pub const MQITEM_STRING: i32 = 2;
pub const MQITEM_BAG: i32 = 3;
pub const MQBL_NULL_TERMINATED: i32 = -1;
pub const MQIASY_COMP_CODE: i32 = -6;
pub const MQIASY_REASON: i32 = -7;

// ---------------------------------------------------------------------------
//  Reason code text
// ---------------------------------------------------------------------------

static REASONS: LazyLock<HashMap<i32, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (MQRC_NONE, "MQRC_NONE"),
        (MQRC_ALREADY_CONNECTED, "MQRC_ALREADY_CONNECTED"),
        (MQRC_BACKED_OUT, "MQRC_BACKED_OUT"),
        (MQRC_BUFFER_LENGTH_ERROR, "MQRC_BUFFER_LENGTH_ERROR"),
        (MQRC_CONNECTION_BROKEN, "MQRC_CONNECTION_BROKEN"),
        (MQRC_DATA_LENGTH_ERROR, "MQRC_DATA_LENGTH_ERROR"),
        (MQRC_DYNAMIC_Q_NAME_ERROR, "MQRC_DYNAMIC_Q_NAME_ERROR"),
        (MQRC_ENVIRONMENT_ERROR, "MQRC_ENVIRONMENT_ERROR"),
        (MQRC_GET_INHIBITED, "MQRC_GET_INHIBITED"),
        (MQRC_HANDLE_NOT_AVAILABLE, "MQRC_HANDLE_NOT_AVAILABLE"),
        (MQRC_HCONN_ERROR, "MQRC_HCONN_ERROR"),
        (MQRC_HOBJ_ERROR, "MQRC_HOBJ_ERROR"),
        (MQRC_INHIBIT_VALUE_ERROR, "MQRC_INHIBIT_VALUE_ERROR"),
        (MQRC_INT_ATTR_COUNT_ERROR, "MQRC_INT_ATTR_COUNT_ERROR"),
        (MQRC_MD_ERROR, "MQRC_MD_ERROR"),
        (MQRC_MISSING_REPLY_TO_Q, "MQRC_MISSING_REPLY_TO_Q"),
        (MQRC_MSG_TOO_BIG_FOR_Q, "MQRC_MSG_TOO_BIG_FOR_Q"),
        (MQRC_NO_MSG_AVAILABLE, "MQRC_NO_MSG_AVAILABLE"),
        (MQRC_NO_MSG_UNDER_CURSOR, "MQRC_NO_MSG_UNDER_CURSOR"),
        (MQRC_NOT_AUTHORIZED, "MQRC_NOT_AUTHORIZED"),
        (MQRC_NOT_OPEN_FOR_BROWSE, "MQRC_NOT_OPEN_FOR_BROWSE"),
        (MQRC_NOT_OPEN_FOR_INPUT, "MQRC_NOT_OPEN_FOR_INPUT"),
        (MQRC_NOT_OPEN_FOR_INQUIRE, "MQRC_NOT_OPEN_FOR_INQUIRE"),
        (MQRC_NOT_OPEN_FOR_OUTPUT, "MQRC_NOT_OPEN_FOR_OUTPUT"),
        (MQRC_NOT_OPEN_FOR_SET, "MQRC_NOT_OPEN_FOR_SET"),
        (MQRC_OBJECT_IN_USE, "MQRC_OBJECT_IN_USE"),
        (MQRC_OBJECT_TYPE_ERROR, "MQRC_OBJECT_TYPE_ERROR"),
        (MQRC_OD_ERROR, "MQRC_OD_ERROR"),
        (MQRC_OPTIONS_ERROR, "MQRC_OPTIONS_ERROR"),
        (MQRC_PERSISTENCE_ERROR, "MQRC_PERSISTENCE_ERROR"),
        (MQRC_PRIORITY_ERROR, "MQRC_PRIORITY_ERROR"),
        (MQRC_PUT_INHIBITED, "MQRC_PUT_INHIBITED"),
        (MQRC_Q_FULL, "MQRC_Q_FULL"),
        (MQRC_Q_NOT_EMPTY, "MQRC_Q_NOT_EMPTY"),
        (MQRC_Q_TYPE_ERROR, "MQRC_Q_TYPE_ERROR"),
        (MQRC_Q_MGR_NAME_ERROR, "MQRC_Q_MGR_NAME_ERROR"),
        (MQRC_Q_MGR_NOT_AVAILABLE, "MQRC_Q_MGR_NOT_AVAILABLE"),
        (MQRC_SECURITY_ERROR, "MQRC_SECURITY_ERROR"),
        (MQRC_SELECTOR_ERROR, "MQRC_SELECTOR_ERROR"),
        (MQRC_SYNCPOINT_NOT_AVAILABLE, "MQRC_SYNCPOINT_NOT_AVAILABLE"),
        (MQRC_TRUNCATED_MSG_ACCEPTED, "MQRC_TRUNCATED_MSG_ACCEPTED"),
        (MQRC_TRUNCATED_MSG_FAILED, "MQRC_TRUNCATED_MSG_FAILED"),
        (MQRC_UNKNOWN_OBJECT_NAME, "MQRC_UNKNOWN_OBJECT_NAME"),
        (MQRC_UNKNOWN_OBJECT_Q_MGR, "MQRC_UNKNOWN_OBJECT_Q_MGR"),
        (MQRC_UNKNOWN_REMOTE_Q_MGR, "MQRC_UNKNOWN_REMOTE_Q_MGR"),
        (MQRC_OBJECT_ALREADY_EXISTS, "MQRC_OBJECT_ALREADY_EXISTS"),
        (MQRC_OBJECT_DAMAGED, "MQRC_OBJECT_DAMAGED"),
        (MQRC_FORMAT_ERROR, "MQRC_FORMAT_ERROR"),
        (MQRC_NOT_CONVERTED, "MQRC_NOT_CONVERTED"),
        (MQRC_NO_EXTERNAL_PARTICIPANTS, "MQRC_NO_EXTERNAL_PARTICIPANTS"),
        (MQRC_OUTCOME_MIXED, "MQRC_OUTCOME_MIXED"),
        (MQRC_CNO_ERROR, "MQRC_CNO_ERROR"),
        (MQRC_Q_MGR_QUIESCING, "MQRC_Q_MGR_QUIESCING"),
        (MQRC_Q_MGR_STOPPING, "MQRC_Q_MGR_STOPPING"),
        (MQRC_UNEXPECTED_ERROR, "MQRC_UNEXPECTED_ERROR"),
        (MQRC_CONNECTION_QUIESCING, "MQRC_CONNECTION_QUIESCING"),
        (MQRC_CONNECTION_STOPPING, "MQRC_CONNECTION_STOPPING"),
        (MQRC_CALL_IN_PROGRESS, "MQRC_CALL_IN_PROGRESS"),
        (MQRC_CD_ERROR, "MQRC_CD_ERROR"),
        (MQRC_KEY_REPOSITORY_ERROR, "MQRC_KEY_REPOSITORY_ERROR"),
        (MQRC_SSL_INITIALIZATION_ERROR, "MQRC_SSL_INITIALIZATION_ERROR"),
        (MQRC_CHANNEL_NOT_AVAILABLE, "MQRC_CHANNEL_NOT_AVAILABLE"),
        (MQRC_HOST_NOT_AVAILABLE, "MQRC_HOST_NOT_AVAILABLE"),
        (MQRC_UNKNOWN_CHANNEL_NAME, "MQRC_UNKNOWN_CHANNEL_NAME"),
        (MQRCCF_COMMAND_FAILED, "MQRCCF_COMMAND_FAILED"),
        (MQRCCF_ESCAPE_TYPE_ERROR, "MQRCCF_ESCAPE_TYPE_ERROR"),
        (MQRCCF_MQSC_COMMAND_ERROR, "MQRCCF_MQSC_COMMAND_ERROR"),
        (MQRCCF_COMMAND_INHIBITED, "MQRCCF_COMMAND_INHIBITED"),
    ])
});

/// Symbolic name for a reason code, or `"Unknown Reason code"`.
pub fn reason_text(reason_code: i32) -> &'static str {
    REASONS
        .get(&reason_code)
        .copied()
        .unwrap_or("Unknown Reason code")
}
