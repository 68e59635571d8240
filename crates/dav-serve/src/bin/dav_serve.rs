//! dav-serve: serve a directory over WebDAV.
//!
//! # Usage
//!
//! ```bash
//! # Serve ./share on port 8080
//! dav-serve -d ./share
//!
//! # HTTPS, read-only, with Basic auth
//! dav-serve -d /srv/data -http :8443 -https-mode \
//!     -https-cert-file cert.pem -https-key-file key.pem \
//!     -user alice -password secret -read-only
//! ```

use dav_serve::cli::Cli;
use dav_serve::{webdav, ServerConfig};
use env_logger::Env;
use log::error;
use std::process;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from(Cli::parse_env());

    // Initialize logging
    let log_level = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    if config.verbose {
        print!("{}", config.summary());
    }

    if let Err(e) = webdav::serve(&config).await {
        error!("Server failed to start: {}", e);
        process::exit(1);
    }
}
