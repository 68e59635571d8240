//! WebDAV service and its transport.
//!
//! The WebDAV protocol itself (PROPFIND, LOCK, COPY, ...) is implemented by
//! `dav_server`, on top of its `LocalFs` directory backend. This module
//! supplies the request pipeline in front of it and the listener that serves it.
//!
//! # Example
//!
//! ```ignore
//! use dav_serve::webdav::serve_background;
//! use dav_serve::ServerConfig;
//!
//! let config = ServerConfig {
//!     root_dir: "/srv/data".into(),
//!     listen_addr: "127.0.0.1:0".to_string(),
//!     ..Default::default()
//! };
//! let server = serve_background(&config).await?;
//! println!("Serving at {}", server.url());
//! ```

mod handler;
mod server;

pub use handler::{root_filesystem, WebDavService};
pub use server::{bind, serve, serve_background, BoundListener, WebDavServer};
