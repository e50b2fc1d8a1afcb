use super::external::{self, Reference};
use super::path::{pointer, NodePath};
use crate::error::{ClientError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Upper bound on `$ref` hops during a single resolution.
const MAX_REFERENCE_HOPS: usize = 256;

/// A server entry from the specification's `servers` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A resolved location inside one of the loaded documents.
///
/// Cheap to clone: it shares the document and only records where the value lives.
#[derive(Debug, Clone)]
pub struct Node {
    document: Arc<Value>,
    file: PathBuf,
    pointer: String,
}

impl Node {
    /// The value at this location.
    #[must_use]
    pub fn value(&self) -> &Value {
        self.document.pointer(&self.pointer).unwrap_or(&Value::Null)
    }

    /// The file the value was found in.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// JSON pointer of the value within [`Node::file`].
    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.pointer
    }
}

/// An OpenAPI specification loaded from disk.
///
/// The document is read once and never modified. Lookups use [`NodePath`]s and follow `$ref`
/// transparently, including references into other files next to the specification. Files
/// reached through external references are parsed on first use and cached; the cache only
/// memoizes parsing and never changes what a lookup returns.
///
/// # Example
///
/// ```no_run
/// use brrtclient::spec::{NodePath, Specification};
///
/// let spec = Specification::load("openapi.yaml")?;
/// let title = spec.resolve(&NodePath::from(["info", "title"]))?;
/// # Ok::<(), brrtclient::ClientError>(())
/// ```
#[derive(Debug)]
pub struct Specification {
    file: PathBuf,
    base: PathBuf,
    root: Arc<Value>,
    externals: RwLock<HashMap<PathBuf, Arc<Value>>>,
}

enum Cursor {
    Root,
    External(PathBuf, Arc<Value>),
}

impl Specification {
    /// Load a YAML or JSON specification.
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// [`ClientError::Io`] when the file cannot be read and [`ClientError::Parse`] when it is not
    /// a valid document.
    pub fn load(filename: impl AsRef<Path>) -> Result<Self> {
        let filename = filename.as_ref();
        let file = filename.canonicalize().map_err(|source| ClientError::Io {
            path: filename.to_path_buf(),
            source,
        })?;
        let root = read_document(&file)?;
        debug!(file = %file.display(), "Loaded specification");
        Ok(Self::from_value(root, file))
    }

    /// Wrap an already parsed document as if it had been loaded from `file`.
    ///
    /// External references are resolved relative to `file`'s directory. A relative `file` is
    /// taken relative to the current working directory.
    #[must_use]
    pub fn from_value(root: Value, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let file = std::path::absolute(&file).unwrap_or(file);
        let file = external::normalize(&file);
        let base = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            file,
            base,
            root: Arc::new(root),
            externals: RwLock::new(HashMap::new()),
        }
    }

    /// Path of the specification file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory that external references are confined to.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// The root document.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walk `path` from the root, following `$ref` wherever one is encountered.
    ///
    /// Returns `Ok(None)` when a key is missing or a reference dangles.
    ///
    /// # Errors
    ///
    /// [`ClientError::Permission`] when an external reference leaves the base directory,
    /// [`ClientError::Parse`] when an external file is malformed and
    /// [`ClientError::CyclicReference`] when references loop.
    pub fn resolve(&self, path: &NodePath) -> Result<Option<Node>> {
        let mut cursor = Cursor::Root;
        let mut location: Vec<String> = Vec::new();
        let mut pending: VecDeque<String> = path.segments().iter().cloned().collect();
        let mut visited: HashSet<(PathBuf, String, Vec<String>)> = HashSet::new();

        loop {
            let (file, document) = match &cursor {
                Cursor::Root => (self.file.as_path(), &self.root),
                Cursor::External(file, document) => (file.as_path(), document),
            };
            let Some(current) = walk(document, &location) else {
                return Ok(None);
            };

            if let Some(reference) = current.get("$ref").and_then(Value::as_str) {
                let state = (
                    file.to_path_buf(),
                    pointer(&location),
                    pending.iter().cloned().collect::<Vec<_>>(),
                );
                if visited.len() >= MAX_REFERENCE_HOPS || !visited.insert(state) {
                    return Err(ClientError::CyclicReference {
                        reference: reference.to_string(),
                        path: path.segments().join("/"),
                    });
                }

                let (target, anchor) = match Reference::parse(reference) {
                    Reference::Internal(anchor) => (None, anchor),
                    Reference::External { file: target, anchor } => {
                        match self.external(reference, target, file)? {
                            Some(loaded) => (Some(loaded), anchor),
                            None => return Ok(None),
                        }
                    }
                    Reference::Remote(url) => {
                        warn!(reference = %url, "Remote references are not fetched");
                        return Ok(None);
                    }
                };

                for segment in anchor.into_iter().rev() {
                    pending.push_front(segment);
                }
                if let Some((file, document)) = target {
                    cursor = if file == self.file {
                        Cursor::Root
                    } else {
                        Cursor::External(file, document)
                    };
                }
                location.clear();
                continue;
            }

            let Some(key) = pending.pop_front() else {
                return Ok(Some(Node {
                    document: Arc::clone(document),
                    file: file.to_path_buf(),
                    pointer: pointer(&location),
                }));
            };
            if child(current, &key).is_none() {
                return Ok(None);
            }
            location.push(key);
        }
    }

    /// Resolve `path` and return a clone of the value found there.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn dig(&self, path: &NodePath) -> Result<Option<Value>> {
        Ok(self.resolve(path)?.map(|node| node.value().clone()))
    }

    /// Resolve `path` and return the string found there.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn dig_str(&self, path: &NodePath) -> Result<Option<String>> {
        Ok(self
            .resolve(path)?
            .and_then(|node| node.value().as_str().map(str::to_string)))
    }

    /// The `$ref` written at `path`, if the node there is a reference.
    ///
    /// The parent is resolved normally; the last key is looked up without following the
    /// reference so the original `$ref` value is returned.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn reference(&self, path: &NodePath) -> Result<Option<String>> {
        let (Some(parent), Some(key)) = (path.parent(), path.last()) else {
            return Ok(None);
        };
        let Some(parent) = self.resolve(&parent)? else {
            return Ok(None);
        };
        Ok(child(parent.value(), key)
            .and_then(|raw| raw.get("$ref"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Servers declared at the top level of the specification.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn servers(&self) -> Result<Vec<Server>> {
        let Some(servers) = self.dig(&NodePath::from(["servers"]))? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_value(servers).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed servers list");
            Vec::new()
        }))
    }

    /// URL of the first declared server.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn default_base_url(&self) -> Result<Option<String>> {
        Ok(self.servers()?.into_iter().next().map(|server| server.url))
    }

    fn external(
        &self,
        reference: &str,
        target: &str,
        from: &Path,
    ) -> Result<Option<(PathBuf, Arc<Value>)>> {
        let current_dir = from.parent().unwrap_or(&self.base);
        let file = external::locate(reference, target, current_dir, &self.base)?;

        if file == self.file {
            return Ok(Some((file, Arc::clone(&self.root))));
        }
        if let Some(document) = self
            .externals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&file)
        {
            return Ok(Some((file, Arc::clone(document))));
        }

        let document = match read_document(&file) {
            Ok(document) => Arc::new(document),
            Err(ClientError::Io { path, source }) => {
                warn!(
                    reference = reference,
                    path = %path.display(),
                    error = %source,
                    "Dangling external reference"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        debug!(reference = reference, file = %file.display(), "Loaded external document");
        self.externals
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file.clone(), Arc::clone(&document));
        Ok(Some((file, document)))
    }
}

/// Read and parse one document; JSON by extension, YAML otherwise.
fn read_document(file: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(file).map_err(|source| ClientError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| ClientError::Parse {
        path: file.to_path_buf(),
        message,
    };
    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))
    } else {
        serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
    }
}

/// Index one level into a mapping or sequence.
pub(crate) fn child<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

/// Plain structural indexing, no reference handling.
fn walk<'v>(value: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(value, |current, key| child(current, key))
}
