//! Request pipeline: access policy, directory listing, WebDAV engine.

use crate::config::ServerConfig;
use crate::listing::{DirectoryListing, Interception};
use crate::policy::{AccessPolicy, Decision, RequestContext};
use bytes::Buf;
use dav_server::body::Body;
use dav_server::localfs::LocalFs;
use dav_server::memls::MemLs;
use dav_server::DavHandler;
use hyper::body::Body as HttpBody;
use hyper::{Method, Request, Response};
use log::trace;
use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;

/// The directory backend shared by the WebDAV engine and the listing.
///
/// New files and directories get world-readable modes (umask still applies).
pub fn root_filesystem(root: &Path) -> LocalFs {
    *LocalFs::new(root, true, false, false)
}

/// The HTTP handler served on every connection.
///
/// Cheap to clone; all clones share one lock table and filesystem.
#[derive(Clone)]
pub struct WebDavService {
    inner: Arc<WebDavServiceInner>,
}

struct WebDavServiceInner {
    policy: AccessPolicy,
    listing: DirectoryListing,
    dav: DavHandler,
}

impl WebDavService {
    pub fn new(config: &ServerConfig) -> Self {
        let fs = root_filesystem(&config.root_dir);

        let dav = DavHandler::builder()
            .filesystem(Box::new(fs.clone()))
            .locksystem(MemLs::new())
            .build_handler();

        Self {
            inner: Arc::new(WebDavServiceInner {
                policy: AccessPolicy::from_config(config),
                listing: DirectoryListing::new(fs),
                dav,
            }),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.inner.policy
    }

    /// Answer one request.
    ///
    /// Rejections from the access policy win over everything else; a `GET`
    /// on a directory is answered with an HTML index; the rest goes to the
    /// WebDAV engine.
    pub async fn handle<ReqBody, ReqData, ReqError>(&self, req: Request<ReqBody>) -> Response<Body>
    where
        ReqData: Buf + Send + 'static,
        ReqError: StdError + Send + Sync + 'static,
        ReqBody: HttpBody<Data = ReqData, Error = ReqError>,
    {
        let ctx = RequestContext::from_request(&req);
        trace!("{} {}", ctx.method, ctx.path);

        if let Decision::Deny(rejection) = self.inner.policy.check(&ctx) {
            return rejection.into_response();
        }

        if ctx.method == Method::GET {
            if let Interception::Intercepted(resp) = self.inner.listing.intercept(&ctx.path).await {
                return resp;
            }
        }

        self.inner.dav.handle(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use tempfile::TempDir;

    #[tokio::test]
    async fn listing_sees_files_written_through_the_engine() {
        let temp = TempDir::new().unwrap();
        let service = WebDavService::new(&ServerConfig {
            root_dir: temp.path().to_path_buf(),
            ..Default::default()
        });

        let put = Request::builder()
            .method(Method::PUT)
            .uri("/notes.txt")
            .body(Full::new(Bytes::from_static(b"notes")))
            .unwrap();
        assert!(service.handle(put).await.status().is_success());

        let get = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let body = service.handle(get).await.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<pre>\n<a href=\"notes.txt\">notes.txt</a>\n</pre>\n");
    }
}
