//! 目录列表页

use std::fmt::Write;
use std::path::Path;

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use log::warn;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// 链接中需要转义的字符
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(super) struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

pub(super) async fn render(dir: &Path, uri_path: &str, head: bool) -> Response {
    let entries = match read_entries(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {:?}: {}", dir, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list directory")
                .into_response();
        }
    };

    let page = listing_html(uri_path, &entries);
    if head {
        let mut response = Response::new(Body::empty());
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(page.len()));
        return response;
    }
    Html(page).into_response()
}

async fn read_entries(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut read = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read.next_entry().await? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

pub(super) fn listing_html(uri_path: &str, entries: &[ListingEntry]) -> String {
    let title = escape_html(uri_path);
    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width\">\
         <title>Index of {title}</title></head>\n<body>\n<h1>Index of {title}</h1>\n<pre>\n"
    );
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        let _ = writeln!(
            page,
            "<a href=\"{}{}\">{}{}</a>",
            utf8_percent_encode(&entry.name, SEGMENT),
            suffix,
            escape_html(&entry.name),
            suffix
        );
    }
    page.push_str("</pre>\n</body></html>\n");
    page
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_links_and_escaping() {
        let entries = vec![
            ListingEntry {
                name: "photos".into(),
                is_dir: true,
            },
            ListingEntry {
                name: "a <b>.txt".into(),
                is_dir: false,
            },
        ];

        let page = listing_html("/", &entries);
        assert!(page.contains("<a href=\"photos/\">photos/</a>"), "{}", page);
        assert!(
            page.contains("<a href=\"a%20%3Cb%3E.txt\">a &lt;b&gt;.txt</a>"),
            "{}",
            page
        );
    }
}
