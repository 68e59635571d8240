//! HTTP/HTTPS listener for the WebDAV service.
//!
//! [`bind`] picks plain TCP or TLS from the configuration, [`BoundListener::run`]
//! accepts connections forever and serves each one on its own task.

use super::WebDavService;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::tls;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

/// How accepted connections are wrapped before HTTP is spoken.
#[derive(Clone)]
enum Transport {
    Plain,
    Tls(TlsAcceptor),
}

/// A bound socket ready to serve.
pub struct BoundListener {
    listener: TcpListener,
    transport: Transport,
    local_addr: SocketAddr,
}

/// Bind the configured address, loading certificates first in HTTPS mode.
pub async fn bind(config: &ServerConfig) -> Result<BoundListener> {
    let transport = if config.https_mode {
        Transport::Tls(tls::load_acceptor(&config.cert_file, &config.key_file)?)
    } else {
        Transport::Plain
    };

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    Ok(BoundListener {
        listener,
        transport,
        local_addr,
    })
}

impl BoundListener {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.transport, Transport::Tls(_))
    }

    /// Accept and serve connections forever.
    ///
    /// Accept failures (descriptor exhaustion, aborted handshakes) are logged
    /// and retried with a growing delay; they never stop the listener.
    pub async fn run(self, service: WebDavService) {
        self.run_until(service, std::future::pending::<()>()).await
    }

    async fn run_until<F>(self, service: WebDavService, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut backoff = AcceptBackoff::default();
        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        backoff.reset();
                        debug!("Connection from {}", remote_addr);
                        spawn_connection(stream, remote_addr, self.transport.clone(), service.clone());
                    }
                    Err(err) => {
                        let delay = backoff.next_delay();
                        error!("Accept error: {}; retrying in {:?}", err, delay);
                        tokio::time::sleep(delay).await;
                    }
                },
                _ = &mut shutdown => {
                    info!("WebDAV server shutting down");
                    return;
                }
            }
        }
    }
}

/// Delay between retries of a failing `accept`: 5ms, doubling up to 1s.
#[derive(Debug, Default)]
struct AcceptBackoff {
    delay: Option<Duration>,
}

impl AcceptBackoff {
    const MIN: Duration = Duration::from_millis(5);
    const MAX: Duration = Duration::from_secs(1);

    fn next_delay(&mut self) -> Duration {
        let delay = match self.delay {
            None => Self::MIN,
            Some(delay) => (delay * 2).min(Self::MAX),
        };
        self.delay = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.delay = None;
    }
}

fn spawn_connection(
    stream: tokio::net::TcpStream,
    remote_addr: SocketAddr,
    transport: Transport,
    service: WebDavService,
) {
    tokio::spawn(async move {
        match transport {
            Transport::Plain => serve_connection(stream, service).await,
            Transport::Tls(acceptor) => match acceptor.accept(stream).await {
                Ok(tls_stream) => serve_connection(tls_stream, service).await,
                Err(err) => debug!("TLS handshake with {} failed: {}", remote_addr, err),
            },
        }
    });
}

async fn serve_connection<S>(stream: S, service: WebDavService)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    if let Err(err) = http1::Builder::new()
        .serve_connection(
            io,
            service_fn(move |req| {
                let service = service.clone();
                async move { Ok::<_, Infallible>(service.handle(req).await) }
            }),
        )
        .await
    {
        error!("Connection error: {:?}", err);
    }
}

/// Serve the configured directory until the process is killed.
///
/// Returns only when binding or loading the certificate fails.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let service = WebDavService::new(config);
    let listener = bind(config).await?;

    info!(
        "WebDAV server listening on {}://{}",
        config.scheme(),
        listener.local_addr()
    );
    info!("Serving {}", config.root_dir.display());
    if config.read_only {
        info!("Read-only mode: PUT, DELETE, PROPPATCH, MKCOL, COPY and MOVE are refused");
    }
    if service.policy().requires_auth() {
        info!("Basic authentication enabled for user {}", config.username);
    }

    listener.run(service).await;
    Ok(())
}

/// Handle to a WebDAV server running on a background task.
pub struct WebDavServer {
    /// Server address.
    addr: SocketAddr,
    /// URL scheme.
    scheme: &'static str,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl WebDavServer {
    /// Get the server's listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.addr)
    }

    /// Stop accepting connections.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for WebDavServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Start a WebDAV server in the background.
///
/// Binding and certificate loading happen before this returns, so those
/// failures are reported here. Use port 0 in `listen_addr` to pick a free port.
pub async fn serve_background(config: &ServerConfig) -> Result<WebDavServer> {
    let service = WebDavService::new(config);
    let listener = bind(config).await?;
    let addr = listener.local_addr();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    info!("WebDAV server started on {}://{}", config.scheme(), addr);

    tokio::spawn(listener.run_until(service, async {
        let _ = shutdown_rx.await;
    }));

    Ok(WebDavServer {
        addr,
        scheme: config.scheme(),
        shutdown_tx: Some(shutdown_tx),
    })
}
