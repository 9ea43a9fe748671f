//! In-memory registry store
//!
//! A case-insensitive key/value tree with the same semantics as the Windows
//! Registry as far as `regscope` uses it. Available on every platform; it backs
//! the test suite and is the default store on non-Windows hosts.
//!
//! Clones share the same tree, so a store handed to several registries (or
//! threads) observes every write.

use super::{Hive, RegistryNode, RegistryStore, RegistryValue};
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct KeyData {
    name: String,
    values: Vec<(String, RegistryValue)>,
    children: Vec<KeyData>,
}

impl KeyData {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&KeyData> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut KeyData> {
        self.children
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn child_or_insert(&mut self, name: &str) -> &mut KeyData {
        let index = match self
            .children
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
        {
            Some(index) => index,
            None => {
                self.children.push(KeyData::named(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn value_index(&self, name: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Default)]
struct Tree {
    local_machine: KeyData,
    current_user: KeyData,
    denied: Vec<(Hive, Vec<String>)>,
}

impl Tree {
    fn root(&self, hive: Hive) -> &KeyData {
        match hive {
            Hive::LocalMachine => &self.local_machine,
            Hive::CurrentUser => &self.current_user,
        }
    }

    fn root_mut(&mut self, hive: Hive) -> &mut KeyData {
        match hive {
            Hive::LocalMachine => &mut self.local_machine,
            Hive::CurrentUser => &mut self.current_user,
        }
    }

    fn find(&self, hive: Hive, segments: &[String]) -> Option<&KeyData> {
        segments
            .iter()
            .try_fold(self.root(hive), |key, segment| key.child(segment))
    }

    fn find_mut(&mut self, hive: Hive, segments: &[String]) -> Option<&mut KeyData> {
        segments
            .iter()
            .try_fold(self.root_mut(hive), |key, segment| key.child_mut(segment))
    }

    fn find_or_create(&mut self, hive: Hive, segments: &[String]) -> &mut KeyData {
        segments
            .iter()
            .fold(self.root_mut(hive), |key, segment| key.child_or_insert(segment))
    }

    fn is_denied(&self, hive: Hive, segments: &[String]) -> bool {
        self.denied.iter().any(|(denied_hive, prefix)| {
            *denied_hive == hive
                && prefix.len() <= segments.len()
                && prefix
                    .iter()
                    .zip(segments)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        })
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('\\')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn location(hive: Hive, segments: &[String]) -> String {
    hive.location(&segments.join("\\"))
}

fn not_found(hive: Hive, segments: &[String]) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("registry key not found: {}", location(hive, segments)),
    )
}

fn denied(hive: Hive, segments: &[String]) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("access denied: {}", location(hive, segments)),
    )
}

/// In-memory registry store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tree: Arc<RwLock<Tree>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key (and any missing parents)
    pub fn create_key(&self, hive: Hive, path: &str) {
        let segments = split_path(path);
        self.tree.write().find_or_create(hive, &segments);
    }

    /// Set a value, creating the key if needed
    pub fn insert_value(
        &self,
        hive: Hive,
        path: &str,
        name: &str,
        value: impl Into<RegistryValue>,
    ) {
        let segments = split_path(path);
        let mut tree = self.tree.write();
        let key = tree.find_or_create(hive, &segments);
        put_value(key, name, value.into());
    }

    /// Remove a key and everything beneath it, returning whether it existed
    pub fn remove_key(&self, hive: Hive, path: &str) -> bool {
        let mut segments = split_path(path);
        let Some(leaf) = segments.pop() else {
            return false;
        };
        let mut tree = self.tree.write();
        let Some(parent) = tree.find_mut(hive, &segments) else {
            return false;
        };
        let before = parent.children.len();
        parent.children.retain(|c| !c.name.eq_ignore_ascii_case(&leaf));
        parent.children.len() != before
    }

    /// Make every open of `path` (or a key beneath it) fail with `PermissionDenied`
    pub fn deny(&self, hive: Hive, path: &str) {
        self.tree.write().denied.push((hive, split_path(path)));
    }

    fn open(&self, hive: Hive, path: &str, mode: OpenMode) -> io::Result<MemoryNode> {
        let segments = split_path(path);
        {
            let mut tree = self.tree.write();
            if tree.is_denied(hive, &segments) {
                return Err(denied(hive, &segments));
            }
            if mode == OpenMode::Create {
                tree.find_or_create(hive, &segments);
            } else if tree.find(hive, &segments).is_none() {
                return Err(not_found(hive, &segments));
            }
        }
        let writable = mode != OpenMode::Read;
        Ok(MemoryNode {
            tree: Arc::clone(&self.tree),
            hive,
            segments,
            writable,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenMode {
    Read,
    Write,
    Create,
}

fn put_value(key: &mut KeyData, name: &str, value: RegistryValue) {
    match key.value_index(name) {
        Some(index) => key.values[index].1 = value,
        None => key.values.push((name.to_string(), value)),
    }
}

impl RegistryStore for MemoryStore {
    type Node = MemoryNode;

    fn open_read_only(&self, hive: Hive, path: &str) -> io::Result<MemoryNode> {
        self.open(hive, path, OpenMode::Read)
    }

    fn open_read_write(&self, hive: Hive, path: &str) -> io::Result<MemoryNode> {
        self.open(hive, path, OpenMode::Create)
    }

    fn open_existing_read_write(&self, hive: Hive, path: &str) -> io::Result<MemoryNode> {
        self.open(hive, path, OpenMode::Write)
    }
}

/// Open key within a [`MemoryStore`]
///
/// The node addresses its key by path; if the key is removed while the node is
/// open, later operations fail with `NotFound`.
#[derive(Debug)]
pub struct MemoryNode {
    tree: Arc<RwLock<Tree>>,
    hive: Hive,
    segments: Vec<String>,
    writable: bool,
}

impl MemoryNode {
    fn with_key<T>(&self, f: impl FnOnce(&KeyData) -> T) -> io::Result<T> {
        let tree = self.tree.read();
        tree.find(self.hive, &self.segments)
            .map(f)
            .ok_or_else(|| not_found(self.hive, &self.segments))
    }

    fn with_key_mut<T>(&self, f: impl FnOnce(&mut KeyData) -> T) -> io::Result<T> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "key opened read-only: {}",
                    location(self.hive, &self.segments)
                ),
            ));
        }
        let mut tree = self.tree.write();
        tree.find_mut(self.hive, &self.segments)
            .map(f)
            .ok_or_else(|| not_found(self.hive, &self.segments))
    }
}

impl RegistryNode for MemoryNode {
    fn child_names(&self) -> io::Result<Vec<String>> {
        self.with_key(|key| key.children.iter().map(|c| c.name.clone()).collect())
    }

    fn open_child(&self, name: &str) -> io::Result<Self> {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());

        let tree = self.tree.read();
        if tree.is_denied(self.hive, &segments) {
            return Err(denied(self.hive, &segments));
        }
        if tree.find(self.hive, &segments).is_none() {
            return Err(not_found(self.hive, &segments));
        }
        Ok(MemoryNode {
            tree: Arc::clone(&self.tree),
            hive: self.hive,
            segments,
            writable: self.writable,
        })
    }

    fn value_names(&self) -> io::Result<Vec<String>> {
        self.with_key(|key| key.values.iter().map(|(n, _)| n.clone()).collect())
    }

    fn value(&self, name: &str) -> io::Result<Option<RegistryValue>> {
        self.with_key(|key| key.value_index(name).map(|i| key.values[i].1.clone()))
    }

    fn set_value(&self, name: &str, value: &RegistryValue) -> io::Result<()> {
        self.with_key_mut(|key| put_value(key, name, value.clone()))
    }

    fn delete_value(&self, name: &str) -> io::Result<bool> {
        self.with_key_mut(|key| match key.value_index(name) {
            Some(index) => {
                key.values.remove(index);
                true
            }
            None => false,
        })
    }
}
