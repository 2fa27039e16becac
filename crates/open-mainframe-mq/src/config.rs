//! Connection configuration: queue manager name, transport mode, client
//! channel, TLS and credential settings.
//!
//! Options can be built in code or loaded from TOML:
//!
//! ```toml
//! q_mgr_name = "QM1"
//! connection_name = "mq.example.com(1414)"
//! channel_name = "APP.SVRCONN"
//! ssl_cipher_spec = "TLS_RSA_WITH_AES_256_CBC_SHA256"
//! key_repository = "/var/mqm/ssl/key"
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{MQCNO_NONE, MQXPT_TCP};
use crate::error::MqError;
use crate::transport::TransportMode;

/// Default server-connection channel for client connections.
pub const DEFAULT_CHANNEL: &str = "SYSTEM.DEF.SVRCONN";

/// Options used when connecting to a queue manager.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectOptions {
    /// Queue manager name. Blank selects the default queue manager (local)
    /// or whichever queue manager listens at `connection_name` (client).
    #[serde(default)]
    pub q_mgr_name: String,
    /// Transport mode. When unset it is inferred from the client settings.
    #[serde(default)]
    pub mode: Option<TransportMode>,
    /// Raise [`MqError::Transport`] on non-zero completion codes.
    #[serde(default = "default_exception_on_error")]
    pub exception_on_error: bool,
    /// 0: none, 1: MQI calls, 2: loader details, 3: verbose.
    #[serde(default)]
    pub trace_level: u8,
    /// MQCNO_* option bits.
    #[serde(default = "default_connect_options")]
    pub connect_options: i32,
    /// SVRCONN channel name (client only).
    #[serde(default)]
    pub channel_name: Option<String>,
    /// `host(port)` of the listener (client only).
    #[serde(default)]
    pub connection_name: Option<String>,
    /// MQXPT_* transport type (client only).
    #[serde(default = "default_transport_type")]
    pub transport_type: i32,
    #[serde(default)]
    pub max_msg_length: Option<i32>,
    /// Heartbeat interval in seconds.
    #[serde(default)]
    pub heartbeat_interval: Option<i32>,
    #[serde(default)]
    pub keep_alive_interval: Option<i32>,
    #[serde(default)]
    pub ssl_cipher_spec: Option<String>,
    #[serde(default)]
    pub ssl_peer_name: Option<String>,
    /// Key repository stem (without `.kdb`).
    #[serde(default)]
    pub key_repository: Option<String>,
    #[serde(default)]
    pub crypto_hardware: Option<String>,
    /// User id presented through MQCSP.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Take channel definition from MQSERVER, mqclient.ini or the CCDT.
    #[serde(default)]
    pub use_system_connection_data: bool,
    /// Explicit MQ library to load instead of the platform default.
    #[serde(default)]
    pub library_path: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            q_mgr_name: String::new(),
            mode: None,
            exception_on_error: default_exception_on_error(),
            trace_level: 0,
            connect_options: default_connect_options(),
            channel_name: None,
            connection_name: None,
            transport_type: default_transport_type(),
            max_msg_length: None,
            heartbeat_interval: None,
            keep_alive_interval: None,
            ssl_cipher_spec: None,
            ssl_peer_name: None,
            key_repository: None,
            crypto_hardware: None,
            user: None,
            password: None,
            use_system_connection_data: false,
            library_path: None,
        }
    }
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("q_mgr_name", &self.q_mgr_name)
            .field("mode", &self.mode())
            .field("exception_on_error", &self.exception_on_error)
            .field("trace_level", &self.trace_level)
            .field("channel_name", &self.channel_name)
            .field("connection_name", &self.connection_name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("library_path", &self.library_path)
            .finish_non_exhaustive()
    }
}

impl ConnectOptions {
    /// Options for a local (server bindings) connection.
    pub fn local(q_mgr_name: impl Into<String>) -> Self {
        Self {
            q_mgr_name: q_mgr_name.into(),
            mode: Some(TransportMode::Local),
            ..Default::default()
        }
    }

    /// Options for a client connection over TCP.
    pub fn client(q_mgr_name: impl Into<String>, connection_name: impl Into<String>) -> Self {
        Self {
            q_mgr_name: q_mgr_name.into(),
            mode: Some(TransportMode::Client),
            connection_name: Some(connection_name.into()),
            ..Default::default()
        }
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let options: Self = toml::from_str(text).map_err(|e| MqError::Config {
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MqError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Effective transport mode.
    pub fn mode(&self) -> TransportMode {
        match self.mode {
            Some(mode) => mode,
            None if self.connection_name.is_some()
                || self.channel_name.is_some()
                || self.use_system_connection_data =>
            {
                TransportMode::Client
            }
            None => TransportMode::Local,
        }
    }

    /// Channel name, falling back to [`DEFAULT_CHANNEL`].
    pub fn channel(&self) -> &str {
        self.channel_name.as_deref().unwrap_or(DEFAULT_CHANNEL)
    }

    /// Whether a client channel definition should be passed on connect.
    pub fn uses_channel_definition(&self) -> bool {
        self.mode() == TransportMode::Client && !self.use_system_connection_data
    }

    /// Whether TLS settings are present.
    pub fn uses_tls(&self) -> bool {
        self.ssl_cipher_spec.is_some() || self.key_repository.is_some()
    }

    /// Reject inconsistent combinations.
    pub fn validate(&self) -> crate::Result<()> {
        if self.mode() == TransportMode::Local
            && (self.connection_name.is_some() || self.use_system_connection_data)
        {
            return Err(MqError::InvalidOptions {
                operation: "connect",
                reason: "client connection settings supplied for a local connection".into(),
            });
        }
        if self.uses_channel_definition() && self.connection_name.is_none() {
            return Err(MqError::InvalidOptions {
                operation: "connect",
                reason: "client connections need `connection_name` or `use_system_connection_data`"
                    .into(),
            });
        }
        if self.password.is_some() && self.user.is_none() {
            return Err(MqError::InvalidOptions {
                operation: "connect",
                reason: "`password` given without `user`".into(),
            });
        }
        Ok(())
    }
}

fn default_exception_on_error() -> bool {
    true
}

fn default_connect_options() -> i32 {
    MQCNO_NONE
}

fn default_transport_type() -> i32 {
    MQXPT_TCP
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let opts = ConnectOptions::default();
        assert!(opts.exception_on_error);
        assert_eq!(opts.trace_level, 0);
        assert_eq!(opts.mode(), TransportMode::Local);
        assert_eq!(opts.channel(), DEFAULT_CHANNEL);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_mode_inferred_from_connection_name() {
        let opts = ConnectOptions {
            connection_name: Some("localhost(1414)".into()),
            ..Default::default()
        };
        assert_eq!(opts.mode(), TransportMode::Client);
        assert!(opts.uses_channel_definition());
    }

    #[test]
    fn test_from_toml() {
        let opts = ConnectOptions::from_toml_str(
            r#"
            q_mgr_name = "QM1"
            connection_name = "mq.example.com(1414)"
            channel_name = "APP.SVRCONN"
            exception_on_error = false
            trace_level = 2
            "#,
        )
        .unwrap();
        assert_eq!(opts.q_mgr_name, "QM1");
        assert_eq!(opts.mode(), TransportMode::Client);
        assert_eq!(opts.channel(), "APP.SVRCONN");
        assert!(!opts.exception_on_error);
        assert_eq!(opts.trace_level, 2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConnectOptions::from_toml_str("q_mgr_name = \"QM1\"\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, MqError::Config { .. }));
    }

    #[test]
    fn test_explicit_mode() {
        let opts = ConnectOptions::from_toml_str("mode = \"local\"\nq_mgr_name = \"QM1\"\n").unwrap();
        assert_eq!(opts.mode(), TransportMode::Local);
    }

    #[test]
    fn test_client_requires_connection_name() {
        let opts = ConnectOptions {
            mode: Some(TransportMode::Client),
            ..Default::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(MqError::InvalidOptions { .. })
        ));

        let system = ConnectOptions {
            use_system_connection_data: true,
            ..Default::default()
        };
        assert!(system.validate().is_ok());
        assert!(!system.uses_channel_definition());
    }

    #[test]
    fn test_password_requires_user() {
        let opts = ConnectOptions {
            password: Some("secret".into()),
            ..ConnectOptions::local("QM1")
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let opts = ConnectOptions {
            user: Some("app".into()),
            password: Some("hunter2".into()),
            ..ConnectOptions::local("QM1")
        };
        let text = format!("{opts:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("********"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "q_mgr_name = \"QM2\"").unwrap();
        writeln!(file, "mode = \"local\"").unwrap();
        let opts = ConnectOptions::from_file(file.path()).unwrap();
        assert_eq!(opts.q_mgr_name, "QM2");

        let missing = ConnectOptions::from_file("/nonexistent/mq.toml");
        assert!(matches!(missing, Err(MqError::Config { .. })));
    }
}
