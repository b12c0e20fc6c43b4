//! 请求路由与文件响应

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
};
use log::{debug, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio::fs::File;

use super::listing;
use crate::target::{ServeMode, ServingTarget};

/// RFC 5987 `attr-char` 之外的字符都需要转义
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

struct ServeState {
    target: ServingTarget,
}

/// 构造分享路由：所有路径都走同一个处理器
pub fn router(target: ServingTarget) -> Router {
    let state = Arc::new(ServeState { target });
    Router::new().fallback(serve_request).with_state(state)
}

async fn serve_request(
    State(state): State<Arc<ServeState>>,
    method: Method,
    uri: Uri,
) -> Response {
    debug!("{} {}", method, uri);

    let head = match method {
        Method::GET => false,
        Method::HEAD => true,
        _ => {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET, HEAD")],
                "Method not allowed",
            )
                .into_response();
        }
    };

    let target = &state.target;
    match target.mode() {
        ServeMode::File => send_file(target.path(), head, target.file_name().as_deref()).await,
        ServeMode::Directory => serve_directory(target.path(), uri.path(), head).await,
    }
}

async fn serve_directory(root: &Path, uri_path: &str, head: bool) -> Response {
    let Some(relative) = request_path(uri_path) else {
        debug!("Rejected request path {:?}", uri_path);
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let full = root.join(relative);
    let meta = match tokio::fs::metadata(&full).await {
        Ok(meta) => meta,
        Err(e) => return io_error_response(&full, e),
    };

    if !meta.is_dir() {
        return send_file(&full, head, None).await;
    }

    if !uri_path.ends_with('/') {
        return Redirect::permanent(&directory_redirect(uri_path)).into_response();
    }

    let index = full.join("index.html");
    if tokio::fs::metadata(&index)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        return send_file(&index, head, None).await;
    }

    listing::render(&full, uri_path, head).await
}

/// 目录补全斜杠的重定向目标
///
/// 使用 `./<最后一段>/` 相对地址，避免 `//host` 形式的路径被当成跨站地址。
pub(super) fn directory_redirect(uri_path: &str) -> String {
    let last = uri_path.rsplit('/').next().unwrap_or_default();
    format!("./{}/", last)
}

/// 把请求路径解码为相对路径，拒绝 `..` 等越界组件
pub(super) fn request_path(uri_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return None,
        }
    }
    Some(relative)
}

/// 发送文件内容，`attachment` 非空时附带下载文件名
pub(super) async fn send_file(path: &Path, head: bool, attachment: Option<&str>) -> Response {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => return io_error_response(path, e),
    };
    let len = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(e) => return io_error_response(path, e),
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut response = if head {
        Response::new(Body::empty())
    } else {
        let stream = tokio_util::io::ReaderStream::new(file);
        Response::new(Body::from_stream(stream))
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Some(name) = attachment {
        if let Ok(value) = HeaderValue::from_str(&content_disposition(name)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    response
}

/// `attachment; filename*=UTF-8''<name>`
pub(super) fn content_disposition(name: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(name, ATTR_CHAR)
    )
}

fn io_error_response(path: &Path, err: io::Error) -> Response {
    match err.kind() {
        io::ErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
        io::ErrorKind::PermissionDenied => {
            (StatusCode::FORBIDDEN, "Permission denied").into_response()
        }
        _ => {
            warn!("Failed to read {:?}: {}", path, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_plain() {
        assert_eq!(request_path("/"), Some(PathBuf::new()));
        assert_eq!(
            request_path("/docs/a.txt"),
            Some(PathBuf::from("docs").join("a.txt"))
        );
    }

    #[test]
    fn test_request_path_decodes_escapes() {
        assert_eq!(
            request_path("/my%20file.txt"),
            Some(PathBuf::from("my file.txt"))
        );
    }

    #[test]
    fn test_directory_redirect_stays_on_host() {
        assert_eq!(directory_redirect("/sub"), "./sub/");
        assert_eq!(directory_redirect("/photos/2024"), "./2024/");
        assert_eq!(directory_redirect("//evil.example"), "./evil.example/");
        assert_eq!(directory_redirect("/a:b"), "./a:b/");
    }

    #[test]
    fn test_content_disposition_keeps_attr_chars() {
        assert_eq!(
            content_disposition("my-notes_v1.2.txt"),
            "attachment; filename*=UTF-8''my-notes_v1.2.txt"
        );
        assert_eq!(
            content_disposition("照片 1.jpg"),
            "attachment; filename*=UTF-8''%E7%85%A7%E7%89%87%201.jpg"
        );
    }

    #[test]
    fn test_request_path_rejects_traversal() {
        assert_eq!(request_path("/../etc/passwd"), None);
        assert_eq!(request_path("/docs/%2e%2e/%2e%2e/secret"), None);
        assert_eq!(request_path("/a\\..\\b"), None);
    }
}
