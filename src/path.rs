use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::FileServerError;

/// A percent-decoded path relative to the served root.
///
/// Built only through [`RelativePath::parse`], which guarantees every
/// component is a plain name: no `..`, no absolute or prefix components,
/// no NUL bytes. Joining it to a root therefore never leaves that root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RelativePath {
    components: Vec<String>,
}

impl RelativePath {
    /// The served root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the raw, still percent-encoded wildcard remainder of a route.
    ///
    /// Each `/`-separated segment is decoded on its own. Empty and `.`
    /// segments are dropped.
    pub fn parse(raw: &str) -> Result<Self, FileServerError> {
        let mut components = Vec::new();

        for segment in raw.split('/') {
            let decoded = urlencoding::decode(segment)
                .map_err(|_| FileServerError::MalformedPath(segment.to_string()))?;

            if decoded.contains('\0') {
                warn!("Path segment contains null byte: {:?}", segment);
                return Err(FileServerError::MalformedPath(segment.to_string()));
            }

            // A decoded segment may itself carry separators (`a%2Fb`).
            for component in Path::new(decoded.as_ref()).components() {
                match component {
                    Component::Normal(name) => {
                        components.push(name.to_string_lossy().into_owned());
                    }
                    Component::CurDir => continue,
                    Component::ParentDir => {
                        warn!("Path traversal attempt detected: parent directory (..) in {:?}", raw);
                        return Err(FileServerError::PathTraversal);
                    }
                    Component::RootDir | Component::Prefix(_) => {
                        // A bare separator from splitting is already gone, so this
                        // only fires for decoded absolute segments like `%2Fetc`.
                        if decoded.trim_matches('/').is_empty() {
                            continue;
                        }
                        warn!("Absolute path component in decoded segment {:?}", segment);
                        return Err(FileServerError::PathTraversal);
                    }
                }
            }
        }

        Ok(Self { components })
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Last component, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Absolute location of this path beneath `root`.
    pub fn join_to(&self, root: &Path) -> PathBuf {
        let mut result = root.to_path_buf();
        for component in &self.components {
            result.push(component);
        }
        result
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.components.join("/"))
    }
}
