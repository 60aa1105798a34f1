use std::fmt::{self, Display};

/// Human-readable location of a decode target, like `server.ports[2]` or `labels[env]`.
///
/// Used in error messages and [`Metadata`](crate::Metadata) entries. The root is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// The empty root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a record field, joining with `.` unless this is the root.
    pub fn field(&self, name: &str) -> Self {
        if self.is_root() {
            FieldPath(name.to_owned())
        } else {
            FieldPath(format!("{}.{name}", self.0))
        }
    }

    /// Appends a sequence index.
    pub fn index(&self, index: usize) -> Self {
        FieldPath(format!("{}[{index}]", self.0))
    }

    /// Appends a mapping key.
    pub fn key(&self, key: impl Display) -> Self {
        FieldPath(format!("{}[{key}]", self.0))
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}
