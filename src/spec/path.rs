use std::fmt;

/// An ordered sequence of keys addressing a location in a specification document.
///
/// Node paths are used everywhere instead of parsed AST nodes: operations, media types and
/// schemas all carry the path that leads to them from the document root, and every lookup goes
/// through [`Specification::resolve`](super::Specification::resolve) so `$ref` indirections are
/// followed transparently. Sequence indices are plain decimal keys (`"0"`, `"1"`, …).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// The empty path, addressing the document root.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from any sequence of keys.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// A new path with `key` appended.
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.into());
        Self(segments)
    }

    /// A new path with all of `keys` appended.
    #[must_use]
    pub fn join<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = self.0.clone();
        segments.extend(keys.into_iter().map(Into::into));
        Self(segments)
    }

    /// The path without its last key, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Key at `index` counted from the end (`0` is the last key).
    #[must_use]
    pub fn from_end(&self, index: usize) -> Option<&str> {
        let position = self.0.len().checked_sub(index + 1)?;
        self.0.get(position).map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Position of the first occurrence of `key`.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|segment| segment == key)
    }

    /// The first `len` keys.
    #[must_use]
    pub fn truncate(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    #[must_use]
    pub fn ends_with(&self, suffix: &[&str]) -> bool {
        self.0.len() >= suffix.len()
            && self.0[self.0.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(a, b)| a == b)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as an RFC 6901 JSON pointer (`/paths/~1books/get`).
    #[must_use]
    pub fn to_pointer(&self) -> String {
        pointer(&self.0)
    }
}

/// Render segments as an RFC 6901 JSON pointer.
pub(crate) fn pointer(segments: &[String]) -> String {
    segments.iter().fold(String::new(), |mut acc, segment| {
        acc.push('/');
        acc.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        acc
    })
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}

impl<S: Into<String>> FromIterator<S> for NodePath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<const N: usize> From<[&str; N]> for NodePath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for NodePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}
