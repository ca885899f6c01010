use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path as StdPath;
use walkdir::WalkDir;

/// Immutable, hierarchical name of a file or directory in the namespace.
/// A value type: two paths with the same component sequence are equal and
/// hash identically, regardless of how each was built.
///
/// Serializes as its canonical string form, so it round-trips exactly across
/// the wire codec (C2's requirement) without needing a dedicated wire type.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Path {
    components: Vec<String>,
}

/// A [`Path`] was constructed from input that violates the naming grammar:
/// a missing leading `/`, or a component containing `/` or `:`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidPath(pub String);

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path: {}", self.0)
    }
}

impl std::error::Error for InvalidPath {}

fn validate_component(component: &str) -> Result<(), InvalidPath> {
    if component.is_empty() || component.contains('/') || component.contains(':') {
        return Err(InvalidPath(component.to_string()));
    }
    Ok(())
}

impl Path {
    /// The root path, whose canonical string form is exactly `/`.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parses a path from its canonical string form. Must start with `/` and
    /// must not contain `:`. Empty components produced by repeated `/` are
    /// silently dropped, matching how most POSIX-style path parsers treat
    /// `//a///b` as `/a/b`.
    pub fn new(s: &str) -> Result<Self, InvalidPath> {
        if !s.starts_with('/') {
            return Err(InvalidPath(s.to_string()));
        }
        if s.contains(':') {
            return Err(InvalidPath(s.to_string()));
        }

        let components = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { components })
    }

    /// Builds a new path by appending `component` to `parent`.
    pub fn join(parent: &Path, component: &str) -> Result<Self, InvalidPath> {
        validate_component(component)?;
        let mut components = parent.components.clone();
        components.push(component.to_string());
        Ok(Self { components })
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// The parent path. Fails (panics, a programmer error per spec.md's
    /// taxonomy) when called on the root.
    pub fn parent(&self) -> Path {
        assert!(!self.is_root(), "root has no parent");
        Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        }
    }

    /// The final component's name. Fails (panics) when called on the root.
    pub fn last(&self) -> &str {
        assert!(!self.is_root(), "root has no last component");
        self.components.last().unwrap()
    }

    /// True if `other`'s component sequence is a prefix of `self`'s
    /// (inclusive: a path is always a subpath of itself).
    pub fn is_subpath(&self, other: &Path) -> bool {
        other.components.len() <= self.components.len()
            && self.components[..other.components.len()] == other.components[..]
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    pub fn to_canonical_string(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("/{}", self.components.join("/"))
        }
    }

    /// Recursively walks `root` on the local filesystem, returning the
    /// namespace-relative path of every regular file found. Used by storage
    /// servers to report their pre-existing contents at registration time.
    pub fn walk_files(root: &StdPath) -> std::io::Result<Vec<Path>> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("walkdir entries are always under root");

            let mut path = Path::root();
            for part in relative.components() {
                let name = part.as_os_str().to_string_lossy();
                path = Path::join(&path, &name)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            }
            paths.push(path);
        }

        Ok(paths)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl std::hash::Hash for Path {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_canonical_string().hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_canonical_string()
    }
}

impl TryFrom<String> for Path {
    type Error = InvalidPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Path::new(&value)
    }
}

impl std::str::FromStr for Path {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::new(s)
    }
}
