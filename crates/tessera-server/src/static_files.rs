//! Serving [`ServeStatic`] mounts from disk.
//!
//! # Security
//!
//! - Path traversal prevention (rejects `..` in paths)
//! - Resolved paths must stay below the mount root
//! - Dotfiles are refused unless [`StaticOptions::dotfiles`](tessera_router::StaticOptions) is set

use std::path::{Component, Path, PathBuf};

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use tessera_core::OutgoingResponse;
use tessera_router::ServeStatic;
use thiserror::Error;

/// Errors that can occur when serving static files.
#[derive(Debug, Error)]
pub enum StaticFileError {
    /// The requested file was not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The path is forbidden (traversal or dotfile).
    #[error("Forbidden path: {0}")]
    Forbidden(String),

    /// Only `GET` and `HEAD` are served.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// I/O error while reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StaticFileError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Serves `rest` (the request path below the mount point) from a mount.
///
/// # Errors
///
/// Returns an error if the method is not `GET`/`HEAD`, the path is
/// forbidden, the file does not exist, or reading fails.
pub fn serve(mount: &ServeStatic, rest: &str, method: &Method) -> Result<OutgoingResponse, StaticFileError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(StaticFileError::MethodNotAllowed);
    }

    let mut file_path = resolve_path(mount, rest)?;
    if file_path.is_dir() {
        let index = mount
            .options()
            .index
            .as_ref()
            .map(|index| file_path.join(index))
            .filter(|index| index.is_file());
        match index {
            Some(index) => file_path = index,
            None => return Err(StaticFileError::NotFound(rest.to_string())),
        }
    }

    let content = std::fs::read(&file_path)?;
    let length = HeaderValue::from(content.len());
    let mime = HeaderValue::from_static(detect_mime_type(&file_path));
    let response = OutgoingResponse::empty(StatusCode::OK)
        .with_header(CONTENT_TYPE, mime)
        .with_header(CONTENT_LENGTH, length);
    if method == Method::HEAD {
        return Ok(response);
    }
    Ok(response.with_body(content))
}

fn resolve_path(mount: &ServeStatic, rest: &str) -> Result<PathBuf, StaticFileError> {
    let path = rest.trim_start_matches('/');

    for component in Path::new(path).components() {
        match component {
            Component::ParentDir => {
                return Err(StaticFileError::Forbidden(
                    "Directory traversal not allowed".to_string(),
                ));
            }
            Component::Normal(name) => {
                let hidden = name.to_str().is_some_and(|name| name.starts_with('.'));
                if hidden && !mount.options().dotfiles {
                    return Err(StaticFileError::Forbidden(
                        "Dotfiles not allowed".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }

    let full_path = mount.root().join(path);
    let canonical = full_path
        .canonicalize()
        .map_err(|_| StaticFileError::NotFound(rest.to_string()))?;
    let canonical_root = mount.root().canonicalize()?;
    if !canonical.starts_with(&canonical_root) {
        return Err(StaticFileError::Forbidden(
            "Path escapes root directory".to_string(),
        ));
    }
    Ok(canonical)
}

fn detect_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "yaml" | "yml" => "application/yaml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}
