//! HTML index for browser `GET` requests on directories.
//!
//! The WebDAV engine has no useful answer for a plain `GET` on a collection,
//! so directories are rendered here as a `<pre>` block of links. Anything
//! that is not a readable directory falls through to the engine.

use dav_server::body::Body;
use dav_server::davpath::DavPath;
use dav_server::fs::{DavFileSystem, OpenOptions, ReadDirMeta};
use dav_server::localfs::LocalFs;
use futures::TryStreamExt;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use log::{debug, error};
use std::fmt::Write as _;

/// Result of [`DirectoryListing::intercept`].
pub enum Interception {
    /// The path is a directory; the response holds its index.
    Intercepted(Response<Body>),
    /// Not a directory (or unreadable); let the WebDAV engine handle it.
    NotIntercepted,
}

impl Interception {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Interception::Intercepted(_))
    }
}

/// One line of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

impl ListingEntry {
    /// Link target and text: the entry name, with `/` appended for directories.
    pub fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Renders directory indexes through the filesystem the WebDAV engine uses.
#[derive(Clone)]
pub struct DirectoryListing {
    fs: LocalFs,
}

impl DirectoryListing {
    pub fn new(fs: LocalFs) -> Self {
        Self { fs }
    }

    /// Produce an index for `path` if it names a directory.
    ///
    /// Nothing is committed to the response until the whole directory has
    /// been read, so every failure can still fall through.
    pub async fn intercept(&self, path: &str) -> Interception {
        let dav_path = match DavPath::new(path) {
            Ok(dav_path) => dav_path,
            Err(_) => return Interception::NotIntercepted,
        };

        let options = OpenOptions {
            read: true,
            ..Default::default()
        };
        let mut handle = match self.fs.open(&dav_path, options).await {
            Ok(handle) => handle,
            Err(_) => return Interception::NotIntercepted,
        };
        match handle.metadata().await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Interception::NotIntercepted,
        }

        let entries = match self.read_entries(&dav_path).await {
            Ok(entries) => entries,
            Err(err) => {
                error!("Error reading directory {}: {:?}", path, err);
                return Interception::NotIntercepted;
            }
        };

        debug!("Listing {} ({} entries)", path, entries.len());
        Interception::Intercepted(index_response(&entries))
    }

    async fn read_entries(
        &self,
        dav_path: &DavPath,
    ) -> Result<Vec<ListingEntry>, dav_server::fs::FsError> {
        let dir_entries: Vec<_> = self
            .fs
            .read_dir(dav_path, ReadDirMeta::Data)
            .await?
            .try_collect()
            .await?;

        let mut entries = Vec::with_capacity(dir_entries.len());
        for entry in dir_entries {
            let is_dir = match entry.metadata().await {
                Ok(meta) => meta.is_dir(),
                Err(_) => false,
            };
            entries.push(ListingEntry {
                name: String::from_utf8_lossy(&entry.name()).into_owned(),
                is_dir,
            });
        }
        Ok(entries)
    }
}

/// Render the index body. Names are emitted verbatim.
pub fn render_index(entries: &[ListingEntry]) -> String {
    let mut html = String::from("<pre>\n");
    for entry in entries {
        let name = entry.display_name();
        let _ = writeln!(html, "<a href=\"{}\">{}</a>", name, name);
    }
    html.push_str("</pre>\n");
    html
}

fn index_response(entries: &[ListingEntry]) -> Response<Body> {
    let mut resp = Response::new(Body::from(render_index(entries)));
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    async fn body_string(resp: Response<Body>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn fixture() -> (TempDir, DirectoryListing) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), b"alpha").unwrap();
        std::fs::create_dir(temp.path().join("b")).unwrap();
        std::fs::write(temp.path().join("b/inner.txt"), b"inner").unwrap();
        let listing = DirectoryListing::new(crate::webdav::root_filesystem(temp.path()));
        (temp, listing)
    }

    #[test]
    fn render_appends_slash_to_directories() {
        let entries = vec![
            ListingEntry {
                name: "a.txt".to_string(),
                is_dir: false,
            },
            ListingEntry {
                name: "b".to_string(),
                is_dir: true,
            },
        ];
        assert_eq!(
            render_index(&entries),
            "<pre>\n<a href=\"a.txt\">a.txt</a>\n<a href=\"b/\">b/</a>\n</pre>\n"
        );
        assert_eq!(render_index(&[]), "<pre>\n</pre>\n");
    }

    #[tokio::test]
    async fn root_directory_is_listed() {
        let (_temp, listing) = fixture();

        let resp = match listing.intercept("/").await {
            Interception::Intercepted(resp) => resp,
            Interception::NotIntercepted => panic!("root should be listed"),
        };
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );

        let body = body_string(resp).await;
        assert!(body.starts_with("<pre>\n"));
        assert!(body.ends_with("</pre>\n"));
        assert!(body.contains("<a href=\"a.txt\">a.txt</a>"));
        assert!(body.contains("<a href=\"b/\">b/</a>"));
        assert_eq!(body.matches("<a href=").count(), 2);
    }

    #[tokio::test]
    async fn subdirectory_is_listed_with_or_without_slash() {
        let (_temp, listing) = fixture();

        for path in ["/b", "/b/"] {
            match listing.intercept(path).await {
                Interception::Intercepted(resp) => {
                    let body = body_string(resp).await;
                    assert!(body.contains("<a href=\"inner.txt\">inner.txt</a>"));
                }
                Interception::NotIntercepted => panic!("{} should be listed", path),
            }
        }
    }

    #[tokio::test]
    async fn files_and_missing_paths_fall_through() {
        let (_temp, listing) = fixture();

        assert!(!listing.intercept("/a.txt").await.is_intercepted());
        assert!(!listing.intercept("/missing").await.is_intercepted());
        assert!(!listing.intercept("/missing/").await.is_intercepted());
        assert!(!listing.intercept("not-a-path").await.is_intercepted());
    }

    #[tokio::test]
    async fn percent_encoded_names_are_resolved() {
        let (temp, listing) = fixture();
        std::fs::create_dir(temp.path().join("with space")).unwrap();

        assert!(listing.intercept("/with%20space/").await.is_intercepted());
    }
}
