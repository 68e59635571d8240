//! # dav-serve
//!
//! Serve a local directory over WebDAV.
//!
//! This crate provides:
//! - A WebDAV server over a root directory, with in-memory locking
//! - Optional HTTP Basic authentication for a single user
//! - An optional read-only mode refusing `PUT`, `DELETE`, `PROPPATCH`,
//!   `MKCOL`, `COPY` and `MOVE`
//! - An HTML index for browser `GET` requests on directories
//! - Plain HTTP or HTTPS (PEM certificate and key)
//!
//! ## Example
//!
//! ```ignore
//! use dav_serve::{webdav, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> dav_serve::Result<()> {
//!     let config = ServerConfig {
//!         root_dir: "/srv/data".into(),
//!         username: "alice".to_string(),
//!         password: "secret".to_string(),
//!         read_only: true,
//!         ..Default::default()
//!     };
//!
//!     // Runs until the process is killed
//!     webdav::serve(&config).await
//! }
//! ```
//!
//! Each request passes through the [`policy::AccessPolicy`] first, then the
//! [`listing::DirectoryListing`] for `GET` requests, and finally the WebDAV
//! engine.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
mod error;
pub mod listing;
pub mod policy;
pub mod tls;
pub mod webdav;

pub use config::{Credentials, ServerConfig};
pub use error::{Error, Result};
pub use webdav::{WebDavServer, WebDavService};
