//! Request path translation module
//!
//! Turns a raw URI path into a normalized, root-relative path that can never
//! climb above the serving root.

use std::path::{Path, PathBuf};

/// A decoded and normalized request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    /// Path segments after decoding and `.`/`..` resolution
    pub segments: Vec<String>,
    /// Whether the raw path ended with `/`
    pub trailing_slash: bool,
    /// Percent-decoded raw path, for display in listings
    pub decoded: String,
}

impl RequestPath {
    /// Decode and normalize a raw URI path
    ///
    /// Returns `None` if the path does not decode to valid UTF-8.
    ///
    /// # Examples
    /// ```
    /// use coi_server::http::path::RequestPath;
    ///
    /// let p = RequestPath::parse("/a/./b/../c%20d/").unwrap();
    /// assert_eq!(p.segments, vec!["a", "c d"]);
    /// assert!(p.trailing_slash);
    ///
    /// let escaped = RequestPath::parse("/../../etc/passwd").unwrap();
    /// assert_eq!(escaped.segments, vec!["etc", "passwd"]);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?.into_owned();
        let trailing_slash = raw.ends_with('/');

        let mut segments: Vec<String> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                // Never let a single segment smuggle in a separator or NUL
                s if s.contains(['\\', '\0']) => {}
                s => segments.push(s.to_string()),
            }
        }

        Some(Self {
            segments,
            trailing_slash,
            decoded,
        })
    }

    /// Join the normalized segments onto `root`
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }

    /// Re-encode the normalized segments as a directory URI path ending in
    /// `/`. The result always starts with exactly one `/`, so it can never be
    /// read as a protocol-relative URL.
    pub fn to_dir_uri(&self) -> String {
        let mut uri = String::from("/");
        for segment in &self.segments {
            uri.push_str(&urlencoding::encode(segment));
            uri.push('/');
        }
        uri
    }
}
