//! Runtime binding of the MQ client or server library.
//!
//! The library is opened on `connect` and every entry point is resolved up
//! front. A library missing any of them is rejected as a whole, so a
//! partially bound table never reaches the transport.

use libloading::Library;
use tracing::{info, trace};

use super::ffi::*;
use super::native::NativeTransport;
use super::{Transport, TransportMode, TransportProvider};
use crate::config::ConnectOptions;
use crate::error::MqError;

/// Entry points resolved from the MQ library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Connx,
    Conn,
    Disc,
    Begin,
    Cmit,
    Back,
    Put,
    Put1,
    Get,
    Open,
    Close,
    Inq,
    Set,
    CreateBag,
    DeleteBag,
    ClearBag,
    Execute,
    CountItems,
    InquireBag,
    InquireItemInfo,
    InquireInteger,
    InquireString,
    AddInquiry,
    AddInteger,
    AddString,
}

impl EntryPoint {
    /// Every entry point, in resolution order.
    pub const ALL: [EntryPoint; 25] = [
        Self::Connx,
        Self::Conn,
        Self::Disc,
        Self::Begin,
        Self::Cmit,
        Self::Back,
        Self::Put,
        Self::Put1,
        Self::Get,
        Self::Open,
        Self::Close,
        Self::Inq,
        Self::Set,
        Self::CreateBag,
        Self::DeleteBag,
        Self::ClearBag,
        Self::Execute,
        Self::CountItems,
        Self::InquireBag,
        Self::InquireItemInfo,
        Self::InquireInteger,
        Self::InquireString,
        Self::AddInquiry,
        Self::AddInteger,
        Self::AddString,
    ];

    /// Exported symbol name.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Connx => "MQCONNX",
            Self::Conn => "MQCONN",
            Self::Disc => "MQDISC",
            Self::Begin => "MQBEGIN",
            Self::Cmit => "MQCMIT",
            Self::Back => "MQBACK",
            Self::Put => "MQPUT",
            Self::Put1 => "MQPUT1",
            Self::Get => "MQGET",
            Self::Open => "MQOPEN",
            Self::Close => "MQCLOSE",
            Self::Inq => "MQINQ",
            Self::Set => "MQSET",
            Self::CreateBag => "mqCreateBag",
            Self::DeleteBag => "mqDeleteBag",
            Self::ClearBag => "mqClearBag",
            Self::Execute => "mqExecute",
            Self::CountItems => "mqCountItems",
            Self::InquireBag => "mqInquireBag",
            Self::InquireItemInfo => "mqInquireItemInfo",
            Self::InquireInteger => "mqInquireInteger",
            Self::InquireString => "mqInquireString",
            Self::AddInquiry => "mqAddInquiry",
            Self::AddInteger => "mqAddInteger",
            Self::AddString => "mqAddString",
        }
    }
}

/// Platform library for a transport mode.
pub fn library_name(mode: TransportMode) -> &'static str {
    #[cfg(windows)]
    {
        match mode {
            TransportMode::Client => "mqic.dll",
            TransportMode::Local => "mqm.dll",
        }
    }
    #[cfg(target_os = "macos")]
    {
        match mode {
            TransportMode::Client => "libmqic_r.dylib",
            TransportMode::Local => "libmqm_r.dylib",
        }
    }
    #[cfg(not(any(windows, target_os = "macos")))]
    {
        match mode {
            TransportMode::Client => "libmqic_r.so",
            TransportMode::Local => "libmqm_r.so",
        }
    }
}

/// Resolved entry points.
#[derive(Clone, Copy)]
pub(crate) struct BindingTable {
    pub connx: MQCONNX_FN,
    /// Resolved so a library without MQCONN is rejected; connects go through MQCONNX.
    #[allow(dead_code)]
    pub conn: MQCONN_FN,
    pub disc: MQDISC_FN,
    pub begin: MQBEGIN_FN,
    pub cmit: MQCMIT_FN,
    pub back: MQBACK_FN,
    pub put: MQPUT_FN,
    pub put1: MQPUT1_FN,
    pub get: MQGET_FN,
    pub open: MQOPEN_FN,
    pub close: MQCLOSE_FN,
    pub inq: MQINQ_FN,
    pub set: MQSET_FN,
    pub create_bag: MQCREATEBAG_FN,
    pub delete_bag: MQDELETEBAG_FN,
    #[allow(dead_code)]
    pub clear_bag: MQCLEARBAG_FN,
    pub execute: MQEXECUTE_FN,
    pub count_items: MQCOUNTITEMS_FN,
    pub inquire_bag: MQINQUIREBAG_FN,
    pub inquire_item_info: MQINQUIREITEMINFO_FN,
    pub inquire_integer: MQINQUIREINTEGER_FN,
    pub inquire_string: MQINQUIRESTRING_FN,
    pub add_inquiry: MQADDINQUIRY_FN,
    pub add_integer: MQADDINTEGER_FN,
    pub add_string: MQADDSTRING_FN,
}

/// A loaded MQ library and its entry points.
pub struct MqLibrary {
    path: String,
    library: Option<Library>,
    bindings: BindingTable,
    trace_level: u8,
}

impl std::fmt::Debug for MqLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqLibrary")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

fn resolve<T: Copy>(library: &Library, path: &str, entry: EntryPoint) -> crate::Result<T> {
    let symbol = entry.symbol();
    let mut name = Vec::with_capacity(symbol.len() + 1);
    name.extend_from_slice(symbol.as_bytes());
    name.push(0);
    // SAFETY: T is the fn pointer type declared for `entry` in `ffi`.
    let found = unsafe { library.get::<T>(&name) };
    found.map(|s| *s).map_err(|_| MqError::MissingEntryPoint {
        library: path.to_string(),
        symbol,
    })
}

impl MqLibrary {
    /// Open the library for `mode` (or `options.library_path`) and resolve
    /// every entry point.
    pub fn load(mode: TransportMode, options: &ConnectOptions) -> crate::Result<Self> {
        let path = options
            .library_path
            .clone()
            .unwrap_or_else(|| library_name(mode).to_string());
        let trace_level = options.trace_level;
        if trace_level >= 1 {
            info!(library = %path, mode = %mode, "loading MQ library");
        }

        // SAFETY: loading runs the library's initialisers; the MQ runtimes
        // have no load-time requirements beyond being on the search path.
        let library = unsafe { Library::new(&path) }.map_err(|e| MqError::BindingLoad {
            library: path.clone(),
            detail: e.to_string(),
        })?;

        macro_rules! bind {
            ($entry:expr) => {{
                let f = resolve(&library, &path, $entry)?;
                if trace_level >= 2 {
                    trace!(symbol = $entry.symbol(), "resolved MQ entry point");
                }
                f
            }};
        }

        let bindings = BindingTable {
            connx: bind!(EntryPoint::Connx),
            conn: bind!(EntryPoint::Conn),
            disc: bind!(EntryPoint::Disc),
            begin: bind!(EntryPoint::Begin),
            cmit: bind!(EntryPoint::Cmit),
            back: bind!(EntryPoint::Back),
            put: bind!(EntryPoint::Put),
            put1: bind!(EntryPoint::Put1),
            get: bind!(EntryPoint::Get),
            open: bind!(EntryPoint::Open),
            close: bind!(EntryPoint::Close),
            inq: bind!(EntryPoint::Inq),
            set: bind!(EntryPoint::Set),
            create_bag: bind!(EntryPoint::CreateBag),
            delete_bag: bind!(EntryPoint::DeleteBag),
            clear_bag: bind!(EntryPoint::ClearBag),
            execute: bind!(EntryPoint::Execute),
            count_items: bind!(EntryPoint::CountItems),
            inquire_bag: bind!(EntryPoint::InquireBag),
            inquire_item_info: bind!(EntryPoint::InquireItemInfo),
            inquire_integer: bind!(EntryPoint::InquireInteger),
            inquire_string: bind!(EntryPoint::InquireString),
            add_inquiry: bind!(EntryPoint::AddInquiry),
            add_integer: bind!(EntryPoint::AddInteger),
            add_string: bind!(EntryPoint::AddString),
        };

        if trace_level >= 2 {
            info!(library = %path, "MQ library and APIs loaded");
        }
        Ok(Self {
            path,
            library: Some(library),
            bindings,
            trace_level,
        })
    }

    /// Library name or path this binding came from.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// Entry points, or `None` once the library has been released.
    pub(crate) fn bindings(&self) -> Option<&BindingTable> {
        self.library.as_ref().map(|_| &self.bindings)
    }

    /// Unload the library. Later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(library) = self.library.take() {
            if self.trace_level >= 2 {
                info!(library = %self.path, "releasing MQ library");
            }
            if let Err(e) = library.close() {
                tracing::warn!(library = %self.path, error = %e, "failed to unload MQ library");
            }
        }
    }
}

impl Drop for MqLibrary {
    fn drop(&mut self) {
        self.release();
    }
}

/// Provider that binds the installed MQ runtime on every connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLibraryProvider;

impl TransportProvider for DynamicLibraryProvider {
    fn load(&self, mode: TransportMode, options: &ConnectOptions) -> crate::Result<Box<dyn Transport>> {
        let library = MqLibrary::load(mode, options)?;
        Ok(Box::new(NativeTransport::new(library, options.trace_level)))
    }
}
