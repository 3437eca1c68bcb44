//! Logical remote paths and the navigation metadata derived from them.

use std::fmt;

/// Marker for the FTP server's root as seen after login.
pub const ROOT: &str = ".";

/// A slash-separated path relative to the FTP server's root.
///
/// Empty segments and `.` segments are dropped, so `"./a//b/"` and `"a/b"`
/// are the same path. `..` segments are kept: whether they are allowed
/// depends on who is asking (see [`RemotePath::has_traversal`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    segments: Vec<String>,
    joined: String,
}

/// One step of the root-to-leaf navigation trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    /// Path from the root up to and including this segment.
    pub path: String,
}

impl RemotePath {
    pub fn new(path: &str) -> RemotePath {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(String::from)
            .collect();
        RemotePath::from_segments(segments)
    }

    pub fn root() -> RemotePath {
        RemotePath::from_segments(Vec::new())
    }

    fn from_segments(segments: Vec<String>) -> RemotePath {
        let joined = if segments.is_empty() { ROOT.to_string() } else { segments.join("/") };
        RemotePath { segments, joined }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path as sent to the FTP server; `"."` for the root.
    pub fn as_str(&self) -> &str {
        &self.joined
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.as_str())
    }

    /// True if any segment walks up to a parent directory. Backslashes
    /// count as separators here too.
    pub fn has_traversal(&self) -> bool {
        self.segments
            .iter()
            .flat_map(|s| s.split('\\'))
            .any(|s| s == "..")
    }

    /// Last segment, if this is not the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// The containing directory, or the root for a top-level name.
    /// The root itself has no parent.
    pub fn parent(&self) -> Option<RemotePath> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(RemotePath::from_segments(segments))
    }

    /// Directory containing this path, falling back to the root.
    pub fn dirname(&self) -> RemotePath {
        self.parent().unwrap_or_else(RemotePath::root)
    }

}

impl Default for RemotePath {
    fn default() -> RemotePath {
        RemotePath::root()
    }
}

impl<'a> From<&'a str> for RemotePath {
    fn from(path: &'a str) -> RemotePath {
        RemotePath::new(path)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

/// Root-to-leaf trail of `path`: one entry per segment, each carrying the
/// cumulative path up to it. The root yields no breadcrumbs.
pub fn breadcrumbs(path: &RemotePath) -> Vec<Breadcrumb> {
    let mut current = String::new();
    path.segments()
        .map(|segment| {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            Breadcrumb { name: segment.to_string(), path: current.clone() }
        })
        .collect()
}

/// Where "up" leads from `path`; `None` at the root, for every caller.
pub fn parent(path: &RemotePath) -> Option<RemotePath> {
    path.parent()
}
