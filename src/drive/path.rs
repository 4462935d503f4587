//! Logical paths and tenant-scoped key composition.
//!
//! Every object key the drive touches is produced by [`TenantRoot::key`].
//! A [`RelativePath`] can only be built through [`RelativePath::parse`],
//! which refuses `..` segments, so a composed key always starts with the
//! tenant's `root/` prefix.

use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::{DriveError, Result};

/// Strip diacritics (NFD decomposition without combining marks).
pub fn remove_accents(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Percent-encode each segment of a logical path for use in a URL.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Make an uploaded file name safe to store.
///
/// Accents are folded to ASCII, path separators and whitespace become `_`,
/// anything outside `[A-Za-z0-9._-]` is dropped and leading or trailing
/// dots and underscores are trimmed. Returns `None` when nothing is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A slash-delimited path under a tenant root.
///
/// A trailing slash marks a folder; the empty path is the root folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RelativePath {
    segments: Vec<String>,
    folder: bool,
}

impl RelativePath {
    /// The tenant root folder.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            folder: true,
        }
    }

    /// Parse a user-supplied path.
    ///
    /// Empty and `.` segments are dropped, backslashes count as separators
    /// and any `..` segment is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment.trim() {
                "" | "." => {}
                ".." => return Err(DriveError::InvalidPath(raw.to_string())),
                _ if segment.chars().any(char::is_control) => {
                    return Err(DriveError::InvalidPath(raw.to_string()))
                }
                _ => segments.push(segment.to_string()),
            }
        }

        let folder = segments.is_empty() || raw.ends_with('/') || raw.ends_with('\\');
        Ok(Self { segments, folder })
    }

    /// Parse a path and treat it as a folder.
    pub fn parse_folder(raw: &str) -> Result<Self> {
        Ok(Self::parse(raw)?.into_folder())
    }

    /// Whether this is the tenant root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether this path denotes a folder.
    pub fn is_folder(&self) -> bool {
        self.folder
    }

    /// The same path as a folder.
    pub fn into_folder(mut self) -> Self {
        self.folder = true;
        self
    }

    /// Last segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Extension of the last segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Containing folder. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self {
            segments,
            folder: true,
        }
    }

    /// Append a single file or folder name.
    pub fn join(&self, name: &str) -> Result<Self> {
        let child = Self::parse(name)?;
        if child.segments.len() != 1 {
            return Err(DriveError::InvalidPath(name.to_string()));
        }
        let mut segments = self.segments.clone();
        segments.extend(child.segments);
        Ok(Self {
            segments,
            folder: child.folder,
        })
    }

    /// Whether `other` is this folder or lies somewhere below it.
    pub fn contains(&self, other: &RelativePath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))?;
        if self.folder && !self.is_root() {
            write!(f, "/")?;
        }
        Ok(())
    }
}

/// The namespace prefix of one tenant inside the shared bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRoot {
    root: String,
}

impl TenantRoot {
    /// Normalize a tenant root. Empty roots and `..` segments are rejected.
    pub fn new(raw: &str) -> Result<Self> {
        let path = RelativePath::parse(raw)?;
        if path.is_root() {
            return Err(DriveError::InvalidPath("empty tenant root".to_string()));
        }
        Ok(Self {
            root: path.segments.join("/"),
        })
    }

    /// Root without trailing slash.
    pub fn as_str(&self) -> &str {
        &self.root
    }

    /// Folder prefix of the whole tenant (`root/`).
    pub fn prefix(&self) -> String {
        format!("{}/", self.root)
    }

    /// Absolute object key of a logical path. Folders end with `/`.
    pub fn key(&self, path: &RelativePath) -> String {
        format!("{}/{}", self.root, path)
    }

    /// Logical path of an absolute key, `None` for keys of other tenants.
    pub fn relative<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(&self.root)?.strip_prefix('/')
    }

    /// Whether one of the root's own segments equals `name`.
    pub fn has_segment(&self, name: &str) -> bool {
        self.root.split('/').any(|s| s == name)
    }
}

impl fmt::Display for TenantRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_and_folder() {
        let file = RelativePath::parse("docs/report.pdf").unwrap();
        assert!(!file.is_folder());
        assert_eq!(file.to_string(), "docs/report.pdf");
        assert_eq!(file.name(), Some("report.pdf"));
        assert_eq!(file.extension(), Some("pdf"));

        let folder = RelativePath::parse("docs/2024/").unwrap();
        assert!(folder.is_folder());
        assert_eq!(folder.to_string(), "docs/2024/");
    }

    #[test]
    fn test_parse_normalizes_separators() {
        let path = RelativePath::parse("/a//./b\\c.txt").unwrap();
        assert_eq!(path.to_string(), "a/b/c.txt");
    }

    #[test]
    fn test_parse_root() {
        for raw in ["", "/", "./", "//"] {
            let path = RelativePath::parse(raw).unwrap();
            assert!(path.is_root());
            assert!(path.is_folder());
            assert_eq!(path.to_string(), "");
        }
    }

    #[test]
    fn test_parse_rejects_traversal() {
        for raw in ["..", "../x", "a/../../b", "a/..", "a\\..\\b", "a/ .. /b"] {
            assert!(
                matches!(RelativePath::parse(raw), Err(DriveError::InvalidPath(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_control_characters() {
        assert!(RelativePath::parse("a\nb.txt").is_err());
    }

    #[test]
    fn test_dotted_names_are_not_traversal() {
        let path = RelativePath::parse("a/..b/c...").unwrap();
        assert_eq!(path.to_string(), "a/..b/c...");
    }

    #[test]
    fn test_extension() {
        assert_eq!(RelativePath::parse(".hidden").unwrap().extension(), None);
        assert_eq!(RelativePath::parse("noext").unwrap().extension(), None);
        assert_eq!(RelativePath::parse("a.tar.gz").unwrap().extension(), Some("gz"));
    }

    #[test]
    fn test_parent_and_join() {
        let path = RelativePath::parse("a/b/c.txt").unwrap();
        assert_eq!(path.parent().to_string(), "a/b/");
        assert_eq!(RelativePath::root().parent(), RelativePath::root());

        let joined = path.parent().join("d.txt").unwrap();
        assert_eq!(joined.to_string(), "a/b/d.txt");

        assert!(path.parent().join("x/y").is_err());
        assert!(path.parent().join("..").is_err());
        assert!(path.parent().join("").is_err());
    }

    #[test]
    fn test_contains() {
        let a = RelativePath::parse("a/").unwrap();
        let ab = RelativePath::parse("a/b/").unwrap();
        let abc = RelativePath::parse("abc/").unwrap();

        assert!(a.contains(&a));
        assert!(a.contains(&ab));
        assert!(!ab.contains(&a));
        assert!(!a.contains(&abc));
        assert!(RelativePath::root().contains(&ab));
    }

    #[test]
    fn test_tenant_key_composition() {
        let root = TenantRoot::new("acme/").unwrap();
        assert_eq!(root.as_str(), "acme");
        assert_eq!(root.prefix(), "acme/");
        assert_eq!(root.key(&RelativePath::root()), "acme/");
        assert_eq!(
            root.key(&RelativePath::parse("x/y.txt").unwrap()),
            "acme/x/y.txt"
        );
        assert_eq!(root.key(&RelativePath::parse("x").unwrap().into_folder()), "acme/x/");
    }

    #[test]
    fn test_composed_keys_never_escape_root() {
        let root = TenantRoot::new("acme").unwrap();
        let inputs = [
            "", "/", "a", "a/b/", "/abs/path", "./a", "a//b", "...", "..a", "a..",
            "a/./b", "%2e%2e/x", "\\\\server\\share",
        ];
        for raw in inputs {
            if let Ok(path) = RelativePath::parse(raw) {
                let key = root.key(&path);
                assert!(key.starts_with("acme/"), "{raw} composed {key}");
                assert!(!key.split('/').any(|s| s == ".."), "{raw} composed {key}");
            }
        }
    }

    #[test]
    fn test_tenant_root_rejects_bad_roots() {
        assert!(TenantRoot::new("").is_err());
        assert!(TenantRoot::new("/").is_err());
        assert!(TenantRoot::new("../other").is_err());
    }

    #[test]
    fn test_tenant_relative() {
        let root = TenantRoot::new("acme").unwrap();
        assert_eq!(root.relative("acme/a/b.txt"), Some("a/b.txt"));
        assert_eq!(root.relative("acme/"), Some(""));
        assert_eq!(root.relative("acmex/a"), None);
        assert_eq!(root.relative("other/a"), None);
    }

    #[test]
    fn test_has_segment() {
        let root = TenantRoot::new("acme/Área_do_Cliente").unwrap();
        assert!(root.has_segment("Área_do_Cliente"));
        assert!(!root.has_segment("Área"));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("a b/Área/x.txt"), "a%20b/%C3%81rea/x.txt");
        assert_eq!(encode_path("docs/"), "docs/");
        assert_eq!(encode_path(""), "");
    }

    #[test]
    fn test_remove_accents() {
        assert_eq!(remove_accents("João Ávila"), "Joao Avila");
        assert_eq!(remove_accents("plain"), "plain");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My File.txt").as_deref(), Some("My_File.txt"));
        assert_eq!(sanitize_file_name("relatório.pdf").as_deref(), Some("relatorio.pdf"));
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(sanitize_file_name(".bashrc").as_deref(), Some("bashrc"));
        assert_eq!(sanitize_file_name("日本語"), None);
        assert_eq!(sanitize_file_name("   "), None);
    }
}
