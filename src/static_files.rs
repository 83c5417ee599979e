use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// StaticFileService
///
/// Contract for the static file collaborator: any GET whose path falls outside the
/// API prefix is handed here and the dispatch pipeline never runs for it. The mock
/// variant lets tests exercise the fallthrough without touching the filesystem.
#[async_trait]
pub trait StaticFileService: Send + Sync {
    /// Resolves a URL path to file bytes and a content type, or None for 404.
    async fn serve(&self, path: &str) -> Option<(&'static str, Vec<u8>)>;
}

/// PublicDir
///
/// The disk-backed implementation, reading from the configured public directory.
/// `/` (and the empty path) map to index.html, mirroring the storefront layout.
pub struct PublicDir {
    root: PathBuf,
}

impl PublicDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StaticFileService for PublicDir {
    async fn serve(&self, path: &str) -> Option<(&'static str, Vec<u8>)> {
        let file_name = if path == "/" || path.is_empty() {
            "index.html"
        } else {
            path
        };

        let sanitized = sanitize_path(file_name);
        if sanitized.is_empty() {
            return None;
        }

        let full_path = self.root.join(&sanitized);
        let bytes = tokio::fs::read(&full_path).await.ok()?;
        Some((content_type_for(&sanitized), bytes))
    }
}

/// sanitize_path
///
/// Utility function to prevent path traversal attacks by removing directory
/// navigation components (e.g., `..`, `.`) from a user-provided path.
fn sanitize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Content type by file extension. Anything unknown is served as a raw byte stream.
fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("");
    match extension {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// StaticFileState
///
/// The concrete type used to share the static file service across the application state.
pub type StaticFileState = Arc<dyn StaticFileService>;
