use std::fmt::Write as _;
use std::path::PathBuf;

/// Default listen address: every interface, port 8080.
pub const DEFAULT_LISTEN_ADDR: &str = ":8080";
/// Default PEM certificate chain used in HTTPS mode.
pub const DEFAULT_CERT_FILE: &str = "cert.pem";
/// Default PEM private key used in HTTPS mode.
pub const DEFAULT_KEY_FILE: &str = "key.pem";

/// Process-wide server configuration.
///
/// Built once at startup and handed by reference to the request pipeline and
/// the transport. Nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory exposed as `/`.
    pub root_dir: PathBuf,
    /// Listen address, `host:port` or `:port`.
    pub listen_addr: String,
    /// Serve HTTPS instead of plain HTTP.
    pub https_mode: bool,
    /// PEM certificate chain, read when binding in HTTPS mode.
    pub cert_file: PathBuf,
    /// PEM private key, read when binding in HTTPS mode.
    pub key_file: PathBuf,
    /// Basic auth user name. Auth is enabled only if this and `password` are set.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Refuse methods that modify the served tree.
    pub read_only: bool,
    /// Print the resolved configuration before serving.
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            https_mode: false,
            cert_file: PathBuf::from(DEFAULT_CERT_FILE),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            username: String::new(),
            password: String::new(),
            read_only: false,
            verbose: false,
        }
    }
}

/// A configured user name and password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl ServerConfig {
    /// Credentials to enforce, or `None` when authentication is disabled.
    ///
    /// Both the user name and the password must be non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        if self.username.is_empty() || self.password.is_empty() {
            return None;
        }
        Some(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }

    /// Address handed to the socket layer.
    ///
    /// An empty host (`":8080"`) means every IPv4 interface.
    pub fn bind_addr(&self) -> String {
        if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        }
    }

    /// URL scheme clients use to reach this server.
    pub fn scheme(&self) -> &'static str {
        if self.https_mode {
            "https"
        } else {
            "http"
        }
    }

    /// Human-readable configuration block printed in verbose mode.
    pub fn summary(&self) -> String {
        let password = if self.password.is_empty() { "" } else { "********" };
        let mut out = String::new();
        let _ = writeln!(out, "Server Configuration:");
        let _ = writeln!(out, "Root Directory: {}", self.root_dir.display());
        let _ = writeln!(out, "HTTP Address: {}", self.listen_addr);
        let _ = writeln!(out, "HTTPS Mode: {}", self.https_mode);
        let _ = writeln!(out, "Certificate File: {}", self.cert_file.display());
        let _ = writeln!(out, "Key File: {}", self.key_file.display());
        let _ = writeln!(out, "Username: {}", self.username);
        let _ = writeln!(out, "Password: {}", password);
        let _ = writeln!(out, "Read-Only Mode: {}", self.read_only);
        out
    }
}
