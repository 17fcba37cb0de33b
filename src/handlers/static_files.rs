//! Static file serving.
//!
//! # Responsibilities
//! - Validate static roots at registration (directory required)
//! - Walk a root at startup for the load-on-startup policy
//! - Resolve request paths under a root and serve files per request,
//!   optionally caching the bytes after the first read
//!
//! # Design Decisions
//! - Startup-loaded files become ordinary GET routes in the route table
//! - Per-request policies are served by `StaticFileHandler`, installed in
//!   the DEFAULT tier of every router
//! - `..`, `.` and empty interior segments never resolve to a file
//! - Cached bytes live in a `DashMap` shared by concurrent dispatches

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::http::{Method, Request, Response};
use crate::observability::metrics;
use crate::routing::error::{DispatchError, RouteError};
use crate::routing::Router;
use crate::views::{content_type_for, FileView, View};

use super::RequestHandler;

/// When static files are read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticPolicy {
    /// Walk the tree once at registration and register every file as a route.
    #[default]
    OnStartupLoad,
    /// Read the file on every request.
    ForEachRequest,
    /// Read on first request, then serve from memory.
    RequestAndLoad,
}

/// A directory served by the static handler at request time.
#[derive(Debug)]
pub struct StaticMount {
    root: PathBuf,
    policy: StaticPolicy,
    cache: DashMap<String, Arc<[u8]>>,
}

impl StaticMount {
    /// Create a mount, checking that `root` is an existing directory.
    pub fn new(root: impl Into<PathBuf>, policy: StaticPolicy) -> Result<Self, RouteError> {
        let root = root.into();
        ensure_directory(&root)?;
        Ok(Self {
            root,
            policy,
            cache: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> StaticPolicy {
        self.policy
    }

    /// Number of files held in the cache.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Map a request path to a file path under the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.strip_prefix('/')?;
        if relative.is_empty() {
            return None;
        }
        let mut path = self.root.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    /// Load the file behind `request_path`, if there is one.
    pub fn load(&self, request_path: &str) -> io::Result<Option<Arc<[u8]>>> {
        if self.policy == StaticPolicy::RequestAndLoad {
            if let Some(hit) = self.cache.get(request_path) {
                return Ok(Some(Arc::clone(hit.value())));
            }
        }

        let Some(path) = self.resolve(request_path) else {
            return Ok(None);
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }

        let data: Arc<[u8]> = Arc::from(fs::read(&path)?);
        if self.policy == StaticPolicy::RequestAndLoad {
            self.cache.insert(request_path.to_string(), Arc::clone(&data));
            metrics::record_static_cache_size(self.cache.len());
            tracing::debug!(path = %path.display(), bytes = data.len(), "Static file cached");
        }
        Ok(Some(data))
    }
}

/// Serves files from the router's per-request static mounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFileHandler;

impl RequestHandler for StaticFileHandler {
    fn handle(
        &self,
        router: &Router,
        request: &Request,
        conn: &mut dyn Write,
    ) -> Result<bool, DispatchError> {
        if request.method() != Method::Get {
            return Ok(false);
        }

        for mount in router.static_mounts() {
            let data = mount
                .load(request.path())
                .map_err(|e| DispatchError::Handler(Box::new(e)))?;
            let Some(data) = data else {
                continue;
            };

            let mut response = Response::for_request(request);
            FileView::from_bytes(data, content_type_for(Path::new(request.path())))
                .render(&mut response)
                .map_err(DispatchError::Handler)?;
            response.write_to(conn)?;

            tracing::debug!(
                path = %request.path(),
                root = %mount.root().display(),
                policy = ?mount.policy(),
                "Served static file"
            );
            return Ok(true);
        }
        Ok(false)
    }
}

/// Fail unless `root` is an existing directory.
pub(crate) fn ensure_directory(root: &Path) -> Result<(), RouteError> {
    let meta = fs::metadata(root).map_err(|e| RouteError::io(root, e))?;
    if meta.is_file() {
        return Err(RouteError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Every regular file under `root` as `(route path, file path)`, sorted by route path.
pub(crate) fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>, RouteError> {
    ensure_directory(root)?;
    let mut files = Vec::new();
    walk(root, "", &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, out: &mut Vec<(String, PathBuf)>) -> Result<(), RouteError> {
    let entries = fs::read_dir(dir).map_err(|e| RouteError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| RouteError::io(dir, e))?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %path.display(), "Skipping static file with non UTF-8 name");
            continue;
        };
        let route = format!("{}/{}", prefix, name);
        let file_type = entry.file_type().map_err(|e| RouteError::io(&path, e))?;
        if file_type.is_dir() {
            walk(&path, &route, out)?;
        } else if file_type.is_file() {
            out.push((route, path));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
        dir
    }

    #[test]
    fn collects_nested_files_without_directories() {
        let dir = tree();
        let files = collect_files(dir.path()).unwrap();
        let routes: Vec<_> = files.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(routes, vec!["/css/site.css", "/index.html"]);
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tree();
        let err = StaticMount::new(dir.path().join("index.html"), StaticPolicy::ForEachRequest).unwrap_err();
        assert!(matches!(err, RouteError::NotADirectory(_)));

        let err = collect_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, RouteError::Io { .. }));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = tree();
        let mount = StaticMount::new(dir.path(), StaticPolicy::ForEachRequest).unwrap();
        assert_eq!(mount.resolve("/css/site.css"), Some(dir.path().join("css").join("site.css")));
        assert_eq!(mount.resolve("/../etc/passwd"), None);
        assert_eq!(mount.resolve("/css/./site.css"), None);
        assert_eq!(mount.resolve("/css//site.css"), None);
        assert_eq!(mount.resolve("/"), None);
        assert_eq!(mount.resolve("relative"), None);
    }

    #[test]
    fn for_each_request_reads_fresh_bytes() {
        let dir = tree();
        let mount = StaticMount::new(dir.path(), StaticPolicy::ForEachRequest).unwrap();
        assert_eq!(&*mount.load("/index.html").unwrap().unwrap(), b"<h1>home</h1>");

        fs::write(dir.path().join("index.html"), "<h1>new</h1>").unwrap();
        assert_eq!(&*mount.load("/index.html").unwrap().unwrap(), b"<h1>new</h1>");
        assert_eq!(mount.cached(), 0);
        assert!(mount.load("/css").unwrap().is_none());
        assert!(mount.load("/nope.txt").unwrap().is_none());
    }

    #[test]
    fn request_and_load_caches_first_read() {
        let dir = tree();
        let mount = StaticMount::new(dir.path(), StaticPolicy::RequestAndLoad).unwrap();
        assert_eq!(&*mount.load("/css/site.css").unwrap().unwrap(), b"body{}");
        assert_eq!(mount.cached(), 1);

        fs::write(dir.path().join("css/site.css"), "changed").unwrap();
        assert_eq!(&*mount.load("/css/site.css").unwrap().unwrap(), b"body{}");
    }
}
