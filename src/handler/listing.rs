//! Directory listing module
//!
//! Renders the HTML index served for directories without an index file.

use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tokio::fs;

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListingEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl ListingEntry {
    fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn href(&self) -> String {
        let encoded = urlencoding::encode(&self.name);
        if self.is_dir {
            format!("{encoded}/")
        } else {
            encoded.into_owned()
        }
    }
}

/// Render an HTML listing of `dir`, titled with the decoded request path
///
/// Entries are sorted case-insensitively. Directories get a trailing `/`,
/// symlinks a trailing `@`. Names that are not valid UTF-8 are skipped.
pub async fn render_listing(dir: &Path, display_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_symlink = entry.file_type().await.is_ok_and(|t| t.is_symlink());
        // Follows symlinks, so a link to a directory is listed as a directory
        let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
        entries.push(ListingEntry {
            name,
            is_dir,
            is_symlink,
        });
    }
    entries.sort_by_key(|e| e.name.to_lowercase());

    Ok(render_html(&entries, display_path))
}

fn render_html(entries: &[ListingEntry], display_path: &str) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));

    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{title}</h1>");
    html.push_str("<hr>\n<ul>\n");
    for entry in entries {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            escape_html(&entry.href()),
            escape_html(&entry.display_name())
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_listing_sorted_and_marked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("A.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("my file.html"), b"").unwrap();

        let html = render_listing(dir.path(), "/site/").await.unwrap();

        assert!(html.contains("<title>Directory listing for /site/</title>"));
        assert!(html.contains("<li><a href=\"css/\">css/</a></li>"));
        assert!(html.contains("<li><a href=\"my%20file.html\">my file.html</a></li>"));

        let a = html.find("A.txt").unwrap();
        let b = html.find("b.txt").unwrap();
        let css = html.find("css/").unwrap();
        let my = html.find("my%20file").unwrap();
        assert!(a < b && b < css && css < my);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("target.txt"), b"t").unwrap();
        std::os::unix::fs::symlink(dir.path().join("target.txt"), dir.path().join("link"))
            .unwrap();

        let html = render_listing(dir.path(), "/").await.unwrap();
        assert!(html.contains("<li><a href=\"link\">link@</a></li>"));
    }

    #[tokio::test]
    async fn test_title_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let html = render_listing(dir.path(), "/<script>/").await.unwrap();
        assert!(html.contains("Directory listing for /&lt;script&gt;/"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_missing_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_listing(&dir.path().join("nope"), "/nope/").await.is_err());
    }
}
