use rpcfs_common::{CommandHandle, FsError, Path, StorageHandle};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// A node in the in-memory directory tree (spec.md §3): a directory XOR a
/// file, never both. Only the root `Node::Directory` is guaranteed to exist;
/// every other node is reachable only by walking down from it.
enum Node {
    Directory(HashMap<String, Node>),
    File {
        storage: StorageHandle,
        command: CommandHandle,
    },
}

impl Node {
    fn empty_directory() -> Self {
        Node::Directory(HashMap::new())
    }
}

fn components_of(path: &Path) -> Vec<String> {
    path.components().map(str::to_string).collect()
}

fn find<'a>(node: &'a Node, components: &[String]) -> Option<&'a Node> {
    match components.split_first() {
        None => Some(node),
        Some((head, rest)) => match node {
            Node::Directory(children) => children.get(head).and_then(|child| find(child, rest)),
            Node::File { .. } => None,
        },
    }
}

/// Creates any missing intermediate directories along `components` and
/// inserts `leaf` at the end. Fails (`false`) if any intermediate component
/// already names a file -- a directory can never be created underneath a
/// file (spec.md §4.6 "creating a file whose parent chain passes through an
/// existing file is an error").
fn insert(node: &mut Node, components: &[String], leaf: Node) -> bool {
    match components.split_first() {
        None => unreachable!("insert is never called with an empty component list"),
        Some((head, rest)) => match node {
            Node::File { .. } => false,
            Node::Directory(children) => {
                if rest.is_empty() {
                    children.insert(head.clone(), leaf);
                    true
                } else {
                    let child = children
                        .entry(head.clone())
                        .or_insert_with(Node::empty_directory);
                    insert(child, rest, leaf)
                }
            }
        },
    }
}

fn remove(node: &mut Node, components: &[String]) -> bool {
    match node {
        Node::File { .. } => false,
        Node::Directory(children) => {
            if components.len() == 1 {
                children.remove(&components[0]).is_some()
            } else {
                match children.get_mut(&components[0]) {
                    Some(child) => remove(child, &components[1..]),
                    None => false,
                }
            }
        }
    }
}

fn collect_command_handles(node: &Node, out: &mut HashSet<CommandHandle>) {
    match node {
        Node::File { command, .. } => {
            out.insert(command.clone());
        }
        Node::Directory(children) => {
            for child in children.values() {
                collect_command_handles(child, out);
            }
        }
    }
}

/// The naming server's in-memory directory tree (spec.md §3/§4.6), guarded
/// by one reader-writer lock per Design Notes §9's concurrency guidance --
/// concurrent reads, exclusive writes, no per-node locking.
pub struct Namespace {
    root: RwLock<Node>,
}

impl Namespace {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::empty_directory()),
        }
    }

    pub fn path_exists(&self, path: &Path) -> bool {
        let root = self.root.read().unwrap();
        find(&root, &components_of(path)).is_some()
    }

    pub fn is_folder(&self, path: &Path) -> bool {
        let root = self.root.read().unwrap();
        matches!(find(&root, &components_of(path)), Some(Node::Directory(_)))
    }

    /// `isDirectory` (spec.md §4.7): fails not-found if `path` doesn't exist,
    /// otherwise reports whether it's a directory. Both checks run against
    /// one `read()` snapshot -- spec.md §5 lists this among the reads that
    /// "may run under a shared lock" (one lock scope for the whole query),
    /// so a concurrent `delete` can't be observed mid-query as "exists" by
    /// one check and "gone" by the other.
    pub fn is_directory(&self, path: &Path) -> Result<bool, FsError> {
        let root = self.root.read().unwrap();
        match find(&root, &components_of(path)) {
            Some(node) => Ok(matches!(node, Node::Directory(_))),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// True iff `path`'s parent exists and is a directory. The root's
    /// "parent" is not a meaningful query (`Path::parent` panics on root);
    /// callers are expected to special-case root before calling this.
    pub fn parent_exists(&self, path: &Path) -> bool {
        self.is_folder(&path.parent())
    }

    pub fn list(&self, dir: &Path) -> Result<Vec<String>, FsError> {
        let root = self.root.read().unwrap();
        match find(&root, &components_of(dir)) {
            Some(Node::Directory(children)) => {
                let mut names: Vec<String> = children.keys().cloned().collect();
                names.sort();
                Ok(names)
            }
            Some(Node::File { .. }) => Err(FsError::NotFound(format!("{dir} is a file"))),
            None => Err(FsError::NotFound(dir.to_string())),
        }
    }

    /// Creates intermediate directories as needed and binds a file node at
    /// `path`. Returns `false` for the root or when the parent chain runs
    /// through an existing file. A pre-existing file at `path` is
    /// overwritten, matching registration's "last registrant wins" rule.
    pub fn add_file(&self, path: &Path, storage: StorageHandle, command: CommandHandle) -> bool {
        if path.is_root() {
            return false;
        }
        let mut root = self.root.write().unwrap();
        insert(
            &mut root,
            &components_of(path),
            Node::File { storage, command },
        )
    }

    /// As [`Namespace::add_file`] but the leaf is an empty directory.
    pub fn add_directory(&self, path: &Path) -> bool {
        if path.is_root() {
            return false;
        }
        let mut root = self.root.write().unwrap();
        insert(&mut root, &components_of(path), Node::empty_directory())
    }

    /// `createFile` (spec.md §4.7): checks that `path`'s parent exists as a
    /// directory and that `path` itself doesn't already exist, then inserts
    /// the binding -- all under one write-lock acquisition. Unlike
    /// [`Namespace::add_file`], the parent is never auto-created (spec.md
    /// §4.6: "during client createFile/createDirectory, the parent must
    /// pre-exist"). Holding a single lock across the check and the insert is
    /// what makes two concurrent `create_file(p)` calls for the same
    /// never-before-seen `p` resolve to exactly one `true`: whichever call
    /// observes the lock first inserts and wins, the other's existence check
    /// now sees that insert and returns `Ok(false)` without touching the
    /// tree (spec.md §8 testable property 7).
    pub fn create_file(
        &self,
        path: &Path,
        storage: StorageHandle,
        command: CommandHandle,
    ) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        let mut root = self.root.write().unwrap();
        match find(&root, &components_of(&path.parent())) {
            Some(Node::Directory(_)) => {}
            _ => return Err(FsError::NotFound(path.parent().to_string())),
        }
        if find(&root, &components_of(path)).is_some() {
            return Ok(false);
        }
        Ok(insert(
            &mut root,
            &components_of(path),
            Node::File { storage, command },
        ))
    }

    /// As [`Namespace::create_file`] but the leaf is an empty directory.
    pub fn create_directory(&self, path: &Path) -> Result<bool, FsError> {
        if path.is_root() {
            return Ok(false);
        }
        let mut root = self.root.write().unwrap();
        match find(&root, &components_of(&path.parent())) {
            Some(Node::Directory(_)) => {}
            _ => return Err(FsError::NotFound(path.parent().to_string())),
        }
        if find(&root, &components_of(path)).is_some() {
            return Ok(false);
        }
        Ok(insert(&mut root, &components_of(path), Node::empty_directory()))
    }

    /// Removes the node (and its subtree) at `path`. Always `false` for the
    /// root, which can never be deleted.
    pub fn delete(&self, path: &Path) -> bool {
        if path.is_root() {
            return false;
        }
        let mut root = self.root.write().unwrap();
        remove(&mut root, &components_of(path))
    }

    pub fn get_storage_handle(&self, path: &Path) -> Result<StorageHandle, FsError> {
        let root = self.root.read().unwrap();
        match find(&root, &components_of(path)) {
            Some(Node::File { storage, .. }) => Ok(storage.clone()),
            Some(Node::Directory(_)) => Err(FsError::NotFound(format!("{path} is a directory"))),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    pub fn get_command_handle(&self, path: &Path) -> Result<CommandHandle, FsError> {
        let root = self.root.read().unwrap();
        match find(&root, &components_of(path)) {
            Some(Node::File { command, .. }) => Ok(command.clone()),
            Some(Node::Directory(_)) => Err(FsError::NotFound(format!("{path} is a directory"))),
            None => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// Every distinct command handle reachable from `path`'s subtree --
    /// used by `delete` on a directory, since files under it may have been
    /// registered by different storage servers.
    pub fn command_handles_under(&self, path: &Path) -> Vec<CommandHandle> {
        let root = self.root.read().unwrap();
        let mut handles = HashSet::new();
        if let Some(node) = find(&root, &components_of(path)) {
            collect_command_handles(node, &mut handles);
        }
        handles.into_iter().collect()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
