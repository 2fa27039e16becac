//! C layouts of the MQI structures and entry point signatures.
//!
//! Layouts follow `cmqc.h` / `cmqxc.h` field by field. Character fields are
//! blank-padded byte arrays; pointers are only set for the duration of a
//! single call.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_void};
use std::ptr;

use crate::config::ConnectOptions;
use crate::constants::*;
use crate::structures::{fill_fixed, get_fixed, MqPmo, Mqgmo, Mqmd, Mqod};
use crate::structures::{MqMsgType, MqPersistence, MqPriority};

pub type MQLONG = i32;
pub type MQHCONN = MQLONG;
pub type MQHOBJ = MQLONG;
pub type MQHBAG = MQLONG;
pub type MQPTR = *mut c_void;

// ---------------------------------------------------------------------------
//  Entry point signatures
// ---------------------------------------------------------------------------

pub type MQCONNX_FN =
    unsafe extern "system" fn(*mut c_char, *mut MQCNO, *mut MQHCONN, *mut MQLONG, *mut MQLONG);
pub type MQCONN_FN = unsafe extern "system" fn(*mut c_char, *mut MQHCONN, *mut MQLONG, *mut MQLONG);
pub type MQDISC_FN = unsafe extern "system" fn(*mut MQHCONN, *mut MQLONG, *mut MQLONG);
pub type MQBEGIN_FN = unsafe extern "system" fn(MQHCONN, MQPTR, *mut MQLONG, *mut MQLONG);
pub type MQBACK_FN = unsafe extern "system" fn(MQHCONN, *mut MQLONG, *mut MQLONG);
pub type MQCMIT_FN = unsafe extern "system" fn(MQHCONN, *mut MQLONG, *mut MQLONG);
pub type MQPUT1_FN = unsafe extern "system" fn(
    MQHCONN,
    *mut MQOD,
    *mut MQMD,
    *mut MQPMO,
    MQLONG,
    MQPTR,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQOPEN_FN =
    unsafe extern "system" fn(MQHCONN, *mut MQOD, MQLONG, *mut MQHOBJ, *mut MQLONG, *mut MQLONG);
pub type MQCLOSE_FN =
    unsafe extern "system" fn(MQHCONN, *mut MQHOBJ, MQLONG, *mut MQLONG, *mut MQLONG);
pub type MQGET_FN = unsafe extern "system" fn(
    MQHCONN,
    MQHOBJ,
    *mut MQMD,
    *mut MQGMO,
    MQLONG,
    MQPTR,
    *mut MQLONG,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQPUT_FN = unsafe extern "system" fn(
    MQHCONN,
    MQHOBJ,
    *mut MQMD,
    *mut MQPMO,
    MQLONG,
    MQPTR,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQINQ_FN = unsafe extern "system" fn(
    MQHCONN,
    MQHOBJ,
    MQLONG,
    *mut MQLONG,
    MQLONG,
    *mut MQLONG,
    MQLONG,
    *mut c_char,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQSET_FN = MQINQ_FN;

pub type MQCREATEBAG_FN = unsafe extern "system" fn(MQLONG, *mut MQHBAG, *mut MQLONG, *mut MQLONG);
pub type MQDELETEBAG_FN = unsafe extern "system" fn(*mut MQHBAG, *mut MQLONG, *mut MQLONG);
pub type MQCLEARBAG_FN = unsafe extern "system" fn(MQHBAG, *mut MQLONG, *mut MQLONG);
pub type MQEXECUTE_FN = unsafe extern "system" fn(
    MQHCONN,
    MQLONG,
    MQHBAG,
    MQHBAG,
    MQHBAG,
    MQHOBJ,
    MQHOBJ,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQCOUNTITEMS_FN =
    unsafe extern "system" fn(MQHBAG, MQLONG, *mut MQLONG, *mut MQLONG, *mut MQLONG);
pub type MQINQUIREBAG_FN =
    unsafe extern "system" fn(MQHBAG, MQLONG, MQLONG, *mut MQHBAG, *mut MQLONG, *mut MQLONG);
pub type MQINQUIREITEMINFO_FN = unsafe extern "system" fn(
    MQHBAG,
    MQLONG,
    MQLONG,
    *mut MQLONG,
    *mut MQLONG,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQINQUIREINTEGER_FN =
    unsafe extern "system" fn(MQHBAG, MQLONG, MQLONG, *mut MQLONG, *mut MQLONG, *mut MQLONG);
pub type MQINQUIRESTRING_FN = unsafe extern "system" fn(
    MQHBAG,
    MQLONG,
    MQLONG,
    MQLONG,
    *mut c_char,
    *mut MQLONG,
    *mut MQLONG,
    *mut MQLONG,
    *mut MQLONG,
);
pub type MQADDINQUIRY_FN = unsafe extern "system" fn(MQHBAG, MQLONG, *mut MQLONG, *mut MQLONG);
pub type MQADDINTEGER_FN =
    unsafe extern "system" fn(MQHBAG, MQLONG, MQLONG, *mut MQLONG, *mut MQLONG);
pub type MQADDSTRING_FN =
    unsafe extern "system" fn(MQHBAG, MQLONG, MQLONG, *mut c_char, *mut MQLONG, *mut MQLONG);

// ---------------------------------------------------------------------------
//  MQMD version 2
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy)]
pub struct MQMD {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub report: MQLONG,
    pub msg_type: MQLONG,
    pub expiry: MQLONG,
    pub feedback: MQLONG,
    pub encoding: MQLONG,
    pub coded_char_set_id: MQLONG,
    pub format: [u8; 8],
    pub priority: MQLONG,
    pub persistence: MQLONG,
    pub msg_id: [u8; 24],
    pub correl_id: [u8; 24],
    pub backout_count: MQLONG,
    pub reply_to_q: [u8; 48],
    pub reply_to_q_mgr: [u8; 48],
    pub user_identifier: [u8; 12],
    pub accounting_token: [u8; 32],
    pub appl_identity_data: [u8; 32],
    pub put_appl_type: MQLONG,
    pub put_appl_name: [u8; 28],
    pub put_date: [u8; 8],
    pub put_time: [u8; 8],
    pub appl_origin_data: [u8; 4],
    pub group_id: [u8; 24],
    pub msg_seq_number: MQLONG,
    pub offset: MQLONG,
    pub msg_flags: MQLONG,
    pub original_length: MQLONG,
}

impl From<&Mqmd> for MQMD {
    fn from(md: &Mqmd) -> Self {
        let mut raw = MQMD {
            struc_id: *b"MD  ",
            version: 2,
            report: md.report,
            msg_type: md.msg_type.as_raw(),
            expiry: md.expiry,
            feedback: md.feedback,
            encoding: md.encoding,
            coded_char_set_id: md.coded_char_set_id,
            format: [b' '; 8],
            priority: md.priority.as_raw(),
            persistence: md.persistence.as_raw(),
            msg_id: md.msg_id,
            correl_id: md.correl_id,
            backout_count: md.backout_count,
            reply_to_q: [b' '; 48],
            reply_to_q_mgr: [b' '; 48],
            user_identifier: [b' '; 12],
            accounting_token: md.accounting_token,
            appl_identity_data: [b' '; 32],
            put_appl_type: md.put_appl_type,
            put_appl_name: [b' '; 28],
            put_date: [b' '; 8],
            put_time: [b' '; 8],
            appl_origin_data: [b' '; 4],
            group_id: md.group_id,
            msg_seq_number: md.msg_seq_number,
            offset: md.offset,
            msg_flags: md.msg_flags,
            original_length: md.original_length,
        };
        fill_fixed(&mut raw.format, &md.format);
        fill_fixed(&mut raw.reply_to_q, &md.reply_to_q);
        fill_fixed(&mut raw.reply_to_q_mgr, &md.reply_to_q_mgr);
        fill_fixed(&mut raw.user_identifier, &md.user_identifier);
        fill_fixed(&mut raw.appl_identity_data, &md.appl_identity_data);
        fill_fixed(&mut raw.put_appl_name, &md.put_appl_name);
        fill_fixed(&mut raw.put_date, &md.put_date);
        fill_fixed(&mut raw.put_time, &md.put_time);
        fill_fixed(&mut raw.appl_origin_data, &md.appl_origin_data);
        raw
    }
}

impl MQMD {
    /// Copy the output fields back into the Rust descriptor.
    pub fn copy_to(&self, md: &mut Mqmd) {
        md.report = self.report;
        md.msg_type = MqMsgType::from_raw(self.msg_type);
        md.expiry = self.expiry;
        md.feedback = self.feedback;
        md.encoding = self.encoding;
        md.coded_char_set_id = self.coded_char_set_id;
        md.format = get_fixed(&self.format);
        md.priority = MqPriority::from_raw(self.priority);
        md.persistence = MqPersistence::from_raw(self.persistence);
        md.msg_id = self.msg_id;
        md.correl_id = self.correl_id;
        md.backout_count = self.backout_count;
        md.reply_to_q = get_fixed(&self.reply_to_q);
        md.reply_to_q_mgr = get_fixed(&self.reply_to_q_mgr);
        md.user_identifier = get_fixed(&self.user_identifier);
        md.accounting_token = self.accounting_token;
        md.appl_identity_data = get_fixed(&self.appl_identity_data);
        md.put_appl_type = self.put_appl_type;
        md.put_appl_name = get_fixed(&self.put_appl_name);
        md.put_date = get_fixed(&self.put_date);
        md.put_time = get_fixed(&self.put_time);
        md.appl_origin_data = get_fixed(&self.appl_origin_data);
        md.group_id = self.group_id;
        md.msg_seq_number = self.msg_seq_number;
        md.offset = self.offset;
        md.msg_flags = self.msg_flags;
        md.original_length = self.original_length;
    }
}

// ---------------------------------------------------------------------------
//  MQOD version 3
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct MQOD {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub object_type: MQLONG,
    pub object_name: [u8; 48],
    pub object_q_mgr_name: [u8; 48],
    pub dynamic_q_name: [u8; 48],
    pub alternate_user_id: [u8; 12],
    pub recs_present: MQLONG,
    pub known_dest_count: MQLONG,
    pub unknown_dest_count: MQLONG,
    pub invalid_dest_count: MQLONG,
    pub object_rec_offset: MQLONG,
    pub response_rec_offset: MQLONG,
    pub object_rec_ptr: MQPTR,
    pub response_rec_ptr: MQPTR,
    pub alternate_security_id: [u8; 40],
    pub resolved_q_name: [u8; 48],
    pub resolved_q_mgr_name: [u8; 48],
}

impl From<&Mqod> for MQOD {
    fn from(od: &Mqod) -> Self {
        let mut raw = MQOD {
            struc_id: *b"OD  ",
            version: 3,
            object_type: od.object_type,
            object_name: [b' '; 48],
            object_q_mgr_name: [b' '; 48],
            dynamic_q_name: [b' '; 48],
            alternate_user_id: [b' '; 12],
            recs_present: 0,
            known_dest_count: 0,
            unknown_dest_count: 0,
            invalid_dest_count: 0,
            object_rec_offset: 0,
            response_rec_offset: 0,
            object_rec_ptr: ptr::null_mut(),
            response_rec_ptr: ptr::null_mut(),
            alternate_security_id: [0u8; 40],
            resolved_q_name: [b' '; 48],
            resolved_q_mgr_name: [b' '; 48],
        };
        fill_fixed(&mut raw.object_name, &od.object_name);
        fill_fixed(&mut raw.object_q_mgr_name, &od.object_qmgr_name);
        fill_fixed(&mut raw.dynamic_q_name, &od.dynamic_q_name);
        fill_fixed(&mut raw.alternate_user_id, &od.alternate_user_id);
        let n = od.alternate_security_id.len().min(40);
        raw.alternate_security_id[..n].copy_from_slice(&od.alternate_security_id[..n]);
        raw
    }
}

impl MQOD {
    pub fn copy_to(&self, od: &mut Mqod) {
        od.object_name = get_fixed(&self.object_name);
        od.resolved_q_name = get_fixed(&self.resolved_q_name);
        od.resolved_qmgr_name = get_fixed(&self.resolved_q_mgr_name);
    }
}

// ---------------------------------------------------------------------------
//  MQGMO version 2 / MQPMO version 1
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct MQGMO {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub options: MQLONG,
    pub wait_interval: MQLONG,
    pub signal1: MQLONG,
    pub signal2: MQLONG,
    pub resolved_q_name: [u8; 48],
    pub match_options: MQLONG,
    pub group_status: u8,
    pub segment_status: u8,
    pub segmentation: u8,
    pub reserved1: u8,
}

impl From<&Mqgmo> for MQGMO {
    fn from(gmo: &Mqgmo) -> Self {
        MQGMO {
            struc_id: *b"GMO ",
            version: 2,
            options: gmo.options,
            wait_interval: gmo.wait_interval,
            signal1: 0,
            signal2: 0,
            resolved_q_name: [b' '; 48],
            match_options: gmo.match_options,
            group_status: b' ',
            segment_status: b' ',
            segmentation: b' ',
            reserved1: b' ',
        }
    }
}

#[repr(C)]
pub struct MQPMO {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub options: MQLONG,
    pub timeout: MQLONG,
    pub context: MQHOBJ,
    pub known_dest_count: MQLONG,
    pub unknown_dest_count: MQLONG,
    pub invalid_dest_count: MQLONG,
    pub resolved_q_name: [u8; 48],
    pub resolved_q_mgr_name: [u8; 48],
}

impl From<&MqPmo> for MQPMO {
    fn from(pmo: &MqPmo) -> Self {
        MQPMO {
            struc_id: *b"PMO ",
            version: 1,
            options: pmo.options,
            timeout: -1,
            context: MQHO_NONE,
            known_dest_count: 0,
            unknown_dest_count: 0,
            invalid_dest_count: 0,
            resolved_q_name: [b' '; 48],
            resolved_q_mgr_name: [b' '; 48],
        }
    }
}

// ---------------------------------------------------------------------------
//  Connection structures: MQCNO v5, MQCD v7, MQSCO v1, MQCSP v1
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct MQCNO {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub options: MQLONG,
    pub client_conn_offset: MQLONG,
    pub client_conn_ptr: MQPTR,
    pub conn_tag: [u8; 128],
    pub ssl_config_ptr: MQPTR,
    pub ssl_config_offset: MQLONG,
    pub connection_id: [u8; 24],
    pub security_parms_offset: MQLONG,
    pub security_parms_ptr: MQPTR,
}

#[repr(C)]
pub struct MQCD {
    pub channel_name: [u8; 20],
    pub version: MQLONG,
    pub channel_type: MQLONG,
    pub transport_type: MQLONG,
    pub desc: [u8; 64],
    pub q_mgr_name: [u8; 48],
    pub xmit_q_name: [u8; 48],
    pub short_connection_name: [u8; 20],
    pub mca_name: [u8; 20],
    pub mode_name: [u8; 8],
    pub tp_name: [u8; 64],
    pub batch_size: MQLONG,
    pub disc_interval: MQLONG,
    pub short_retry_count: MQLONG,
    pub short_retry_interval: MQLONG,
    pub long_retry_count: MQLONG,
    pub long_retry_interval: MQLONG,
    pub security_exit: [u8; 128],
    pub msg_exit: [u8; 128],
    pub send_exit: [u8; 128],
    pub receive_exit: [u8; 128],
    pub seq_number_wrap: MQLONG,
    pub max_msg_length: MQLONG,
    pub put_authority: MQLONG,
    pub data_conversion: MQLONG,
    pub security_user_data: [u8; 32],
    pub msg_user_data: [u8; 32],
    pub send_user_data: [u8; 32],
    pub receive_user_data: [u8; 32],
    // Version 2
    pub user_identifier: [u8; 12],
    pub password: [u8; 12],
    pub mca_user_identifier: [u8; 12],
    pub mca_type: MQLONG,
    pub connection_name: [u8; 264],
    pub remote_user_identifier: [u8; 12],
    pub remote_password: [u8; 12],
    // Version 3
    pub msg_retry_exit: [u8; 128],
    pub msg_retry_user_data: [u8; 32],
    pub msg_retry_count: MQLONG,
    pub msg_retry_interval: MQLONG,
    // Version 4
    pub heartbeat_interval: MQLONG,
    pub batch_interval: MQLONG,
    pub non_persistent_msg_speed: MQLONG,
    pub struc_length: MQLONG,
    pub exit_name_length: MQLONG,
    pub exit_data_length: MQLONG,
    pub msg_exits_defined: MQLONG,
    pub send_exits_defined: MQLONG,
    pub receive_exits_defined: MQLONG,
    pub msg_exit_ptr: MQPTR,
    pub msg_user_data_ptr: MQPTR,
    pub send_exit_ptr: MQPTR,
    pub send_user_data_ptr: MQPTR,
    pub receive_exit_ptr: MQPTR,
    pub receive_user_data_ptr: MQPTR,
    // Version 5
    pub cluster_ptr: MQPTR,
    pub clusters_defined: MQLONG,
    pub network_priority: MQLONG,
    // Version 6
    pub long_mca_user_id_length: MQLONG,
    pub long_remote_user_id_length: MQLONG,
    pub long_mca_user_id_ptr: MQPTR,
    pub long_remote_user_id_ptr: MQPTR,
    pub mca_security_id: [u8; 40],
    pub remote_security_id: [u8; 40],
    // Version 7
    pub ssl_cipher_spec: [u8; 32],
    pub ssl_peer_name_ptr: MQPTR,
    pub ssl_peer_name_length: MQLONG,
    pub ssl_client_auth: MQLONG,
    pub keep_alive_interval: MQLONG,
    pub local_address: [u8; 48],
    pub batch_heartbeat: MQLONG,
}

#[repr(C)]
pub struct MQSCO {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub key_repository: [u8; 256],
    pub crypto_hardware: [u8; 256],
    pub auth_info_rec_count: MQLONG,
    pub auth_info_rec_offset: MQLONG,
    pub auth_info_rec_ptr: MQPTR,
}

#[repr(C)]
pub struct MQCSP {
    pub struc_id: [u8; 4],
    pub version: MQLONG,
    pub authentication_type: MQLONG,
    pub reserved1: [u8; 4],
    pub csp_user_id_ptr: MQPTR,
    pub csp_user_id_offset: MQLONG,
    pub csp_user_id_length: MQLONG,
    pub reserved2: [u8; 8],
    pub csp_password_ptr: MQPTR,
    pub csp_password_offset: MQLONG,
    pub csp_password_length: MQLONG,
}

/// MQCNO plus the structures it points at, kept together so the pointers
/// stay valid for the duration of MQCONNX.
pub struct ConnectBlock {
    cno: Box<MQCNO>,
    cd: Option<Box<MQCD>>,
    sco: Option<Box<MQSCO>>,
    csp: Option<Box<MQCSP>>,
    ssl_peer_name: Vec<u8>,
    user: Vec<u8>,
    password: Vec<u8>,
}

impl ConnectBlock {
    pub fn new(options: &ConnectOptions) -> Self {
        let mut block = ConnectBlock {
            cno: Box::new(MQCNO {
                struc_id: *b"CNO ",
                version: 5,
                options: options.connect_options,
                client_conn_offset: 0,
                client_conn_ptr: ptr::null_mut(),
                conn_tag: [0u8; 128],
                ssl_config_ptr: ptr::null_mut(),
                ssl_config_offset: 0,
                connection_id: [0u8; 24],
                security_parms_offset: 0,
                security_parms_ptr: ptr::null_mut(),
            }),
            cd: None,
            sco: None,
            csp: None,
            ssl_peer_name: options.ssl_peer_name.clone().unwrap_or_default().into_bytes(),
            user: options.user.clone().unwrap_or_default().into_bytes(),
            password: options.password.clone().unwrap_or_default().into_bytes(),
        };

        if options.uses_channel_definition() {
            let mut cd = Box::new(client_channel(options));
            if !block.ssl_peer_name.is_empty() {
                cd.ssl_peer_name_ptr = block.ssl_peer_name.as_mut_ptr().cast();
                cd.ssl_peer_name_length = block.ssl_peer_name.len() as MQLONG;
            }
            block.cno.client_conn_ptr = (&mut *cd as *mut MQCD).cast();
            block.cd = Some(cd);
        }

        if options.key_repository.is_some() || options.crypto_hardware.is_some() {
            let mut sco = Box::new(MQSCO {
                struc_id: *b"SCO ",
                version: 1,
                key_repository: [b' '; 256],
                crypto_hardware: [b' '; 256],
                auth_info_rec_count: 0,
                auth_info_rec_offset: 0,
                auth_info_rec_ptr: ptr::null_mut(),
            });
            fill_fixed(&mut sco.key_repository, options.key_repository.as_deref().unwrap_or(""));
            fill_fixed(&mut sco.crypto_hardware, options.crypto_hardware.as_deref().unwrap_or(""));
            block.cno.ssl_config_ptr = (&mut *sco as *mut MQSCO).cast();
            block.sco = Some(sco);
        }

        if !block.user.is_empty() {
            let mut csp = Box::new(MQCSP {
                struc_id: *b"CSP ",
                version: 1,
                authentication_type: MQCSP_AUTH_USER_ID_AND_PWD,
                reserved1: [0u8; 4],
                csp_user_id_ptr: block.user.as_mut_ptr().cast(),
                csp_user_id_offset: 0,
                csp_user_id_length: block.user.len() as MQLONG,
                reserved2: [0u8; 8],
                csp_password_ptr: block.password.as_mut_ptr().cast(),
                csp_password_offset: 0,
                csp_password_length: block.password.len() as MQLONG,
            });
            block.cno.security_parms_ptr = (&mut *csp as *mut MQCSP).cast();
            block.csp = Some(csp);
        }

        block
    }

    pub fn cno_ptr(&mut self) -> *mut MQCNO {
        &mut *self.cno
    }

    pub fn has_channel(&self) -> bool {
        self.cd.is_some()
    }

    pub fn has_tls(&self) -> bool {
        self.sco.is_some()
    }

    pub fn has_credentials(&self) -> bool {
        self.csp.is_some()
    }
}

/// MQCD_CLIENT_CONN_DEFAULT with the configured overrides applied.
fn client_channel(options: &ConnectOptions) -> MQCD {
    let mut cd = MQCD {
        channel_name: [b' '; 20],
        version: 7,
        channel_type: MQCHT_CLNTCONN,
        transport_type: options.transport_type,
        desc: [b' '; 64],
        q_mgr_name: [b' '; 48],
        xmit_q_name: [b' '; 48],
        short_connection_name: [b' '; 20],
        mca_name: [b' '; 20],
        mode_name: [b' '; 8],
        tp_name: [b' '; 64],
        batch_size: 50,
        disc_interval: 6000,
        short_retry_count: 10,
        short_retry_interval: 60,
        long_retry_count: 999_999_999,
        long_retry_interval: 1200,
        security_exit: [b' '; 128],
        msg_exit: [b' '; 128],
        send_exit: [b' '; 128],
        receive_exit: [b' '; 128],
        seq_number_wrap: 999_999_999,
        max_msg_length: options.max_msg_length.unwrap_or(4_194_304),
        put_authority: 1,
        data_conversion: 0,
        security_user_data: [b' '; 32],
        msg_user_data: [b' '; 32],
        send_user_data: [b' '; 32],
        receive_user_data: [b' '; 32],
        user_identifier: [b' '; 12],
        password: [b' '; 12],
        mca_user_identifier: [b' '; 12],
        mca_type: 1,
        connection_name: [b' '; 264],
        remote_user_identifier: [b' '; 12],
        remote_password: [b' '; 12],
        msg_retry_exit: [b' '; 128],
        msg_retry_user_data: [b' '; 32],
        msg_retry_count: 10,
        msg_retry_interval: 1000,
        heartbeat_interval: options.heartbeat_interval.unwrap_or(300),
        batch_interval: 0,
        non_persistent_msg_speed: 2,
        struc_length: std::mem::size_of::<MQCD>() as MQLONG,
        exit_name_length: 128,
        exit_data_length: 32,
        msg_exits_defined: 0,
        send_exits_defined: 0,
        receive_exits_defined: 0,
        msg_exit_ptr: ptr::null_mut(),
        msg_user_data_ptr: ptr::null_mut(),
        send_exit_ptr: ptr::null_mut(),
        send_user_data_ptr: ptr::null_mut(),
        receive_exit_ptr: ptr::null_mut(),
        receive_user_data_ptr: ptr::null_mut(),
        cluster_ptr: ptr::null_mut(),
        clusters_defined: 0,
        network_priority: 0,
        long_mca_user_id_length: 0,
        long_remote_user_id_length: 0,
        long_mca_user_id_ptr: ptr::null_mut(),
        long_remote_user_id_ptr: ptr::null_mut(),
        mca_security_id: [0u8; 40],
        remote_security_id: [0u8; 40],
        ssl_cipher_spec: [b' '; 32],
        ssl_peer_name_ptr: ptr::null_mut(),
        ssl_peer_name_length: 0,
        ssl_client_auth: 0,
        keep_alive_interval: options.keep_alive_interval.unwrap_or(-1),
        local_address: [b' '; 48],
        batch_heartbeat: 0,
    };
    fill_fixed(&mut cd.channel_name, options.channel());
    fill_fixed(&mut cd.connection_name, options.connection_name.as_deref().unwrap_or(""));
    fill_fixed(&mut cd.ssl_cipher_spec, options.ssl_cipher_spec.as_deref().unwrap_or(""));
    cd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_fixed_structure_sizes() {
        assert_eq!(size_of::<MQMD>(), 364);
        assert_eq!(size_of::<MQGMO>(), 80);
        assert_eq!(size_of::<MQPMO>(), 128);
    }

    #[test]
    fn test_mqmd_conversion() {
        let md = Mqmd {
            format: MQFMT_STRING.into(),
            persistence: MqPersistence::Persistent,
            reply_to_q: "REPLY.Q".into(),
            ..Default::default()
        };
        let raw = MQMD::from(&md);
        assert_eq!(&raw.struc_id, b"MD  ");
        assert_eq!(&raw.format, b"MQSTR   ");
        assert_eq!(raw.persistence, MQPER_PERSISTENT);
        assert_eq!(raw.priority, MQPRI_PRIORITY_AS_Q_DEF);

        let mut back = Mqmd::default();
        raw.copy_to(&mut back);
        assert_eq!(back, md);
    }

    #[test]
    fn test_mqod_conversion() {
        let od = Mqod {
            object_name: "TEST.Q".into(),
            object_qmgr_name: "QM2".into(),
            ..Default::default()
        };
        let raw = MQOD::from(&od);
        assert_eq!(raw.version, 3);
        assert_eq!(get_fixed(&raw.object_name), "TEST.Q");
        assert_eq!(get_fixed(&raw.dynamic_q_name), "AMQ.*");
    }

    #[test]
    fn test_connect_block_local() {
        let mut block = ConnectBlock::new(&ConnectOptions::local("QM1"));
        assert!(!block.has_channel());
        assert!(!block.has_tls());
        assert!(!block.has_credentials());
        let cno = block.cno_ptr();
        assert!(!cno.is_null());
    }

    #[test]
    fn test_connect_block_client_with_tls_and_credentials() {
        let options = ConnectOptions {
            channel_name: Some("APP.SVRCONN".into()),
            ssl_cipher_spec: Some("TLS_RSA_WITH_AES_128_CBC_SHA256".into()),
            key_repository: Some("/var/mqm/ssl/key".into()),
            user: Some("app".into()),
            password: Some("secret".into()),
            ..ConnectOptions::client("QM1", "localhost(1414)")
        };
        let block = ConnectBlock::new(&options);
        assert!(block.has_channel());
        assert!(block.has_tls());
        assert!(block.has_credentials());

        let cd = block.cd.as_ref().unwrap();
        assert_eq!(get_fixed(&cd.channel_name), "APP.SVRCONN");
        assert_eq!(get_fixed(&cd.connection_name), "localhost(1414)");
        assert_eq!(cd.transport_type, MQXPT_TCP);
        assert_eq!(cd.struc_length as usize, size_of::<MQCD>());
        assert!(!block.cno.client_conn_ptr.is_null());
        assert!(!block.cno.security_parms_ptr.is_null());
    }

    #[test]
    fn test_system_connection_data_skips_channel() {
        let options = ConnectOptions {
            use_system_connection_data: true,
            ..Default::default()
        };
        let block = ConnectBlock::new(&options);
        assert!(!block.has_channel());
    }
}
