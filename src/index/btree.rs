//! Generic multiway B-tree used for every catalog index.
//!
//! The tree is an in-memory balanced search tree with configurable
//! fan-out, persisted wholesale to a single file. Point lookup and
//! insert are logarithmic in the key count; full enumeration walks the
//! nodes in key order. There is no delete: catalog records are
//! append-only and never removed.

use crate::error::{Result, StoreError};
use crate::index::{read_u32, read_u64, take, Codec};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const INDEX_MAGIC: &[u8; 4] = b"BGIX";
const INDEX_VERSION: u16 = 1;
// magic (4) + version (2) + reserved (2) + order (4) + entry count (8)
const INDEX_HEADER_SIZE: usize = 20;

/// Smallest fan-out the tree accepts; below this splitting degenerates.
pub const MIN_ORDER: usize = 4;

#[derive(Debug, Clone)]
struct Node<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    children: Vec<Box<Node<K, V>>>,
    is_leaf: bool,
}

impl<K: Ord + Clone, V: Clone> Node<K, V> {
    fn new(is_leaf: bool) -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            is_leaf,
        }
    }

    fn is_full(&self, order: usize) -> bool {
        self.keys.len() >= order
    }

    fn search(&self, key: &K) -> Option<&V> {
        match self.keys.binary_search(key) {
            Ok(idx) => Some(&self.values[idx]),
            Err(idx) => {
                if self.is_leaf {
                    None
                } else {
                    self.children[idx].search(key)
                }
            }
        }
    }

    fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.keys.binary_search(key) {
            Ok(idx) => Some(&mut self.values[idx]),
            Err(idx) => {
                if self.is_leaf {
                    None
                } else {
                    self.children[idx].search_mut(key)
                }
            }
        }
    }

    /// Inserts a key known to be absent into a node that is not full.
    fn insert_non_full(&mut self, key: K, value: V, order: usize) {
        let idx = match self.keys.binary_search(&key) {
            Ok(_) => return, // caller guarantees absence
            Err(idx) => idx,
        };

        if self.is_leaf {
            self.keys.insert(idx, key);
            self.values.insert(idx, value);
            return;
        }

        if self.children[idx].is_full(order) {
            self.split_child(idx, order);
            // the separator promoted by the split decides which side gets the key
            if key > self.keys[idx] {
                self.children[idx + 1].insert_non_full(key, value, order);
            } else {
                self.children[idx].insert_non_full(key, value, order);
            }
        } else {
            self.children[idx].insert_non_full(key, value, order);
        }
    }

    /// Splits the full child at `idx`, promoting its median into `self`.
    fn split_child(&mut self, idx: usize, order: usize) {
        let mid = order / 2;
        let child = &mut self.children[idx];
        let mut right = Node::new(child.is_leaf);

        let mut right_keys = child.keys.split_off(mid);
        let mut right_values = child.values.split_off(mid);
        let sep_key = right_keys.remove(0);
        let sep_value = right_values.remove(0);
        right.keys = right_keys;
        right.values = right_values;

        if !child.is_leaf {
            right.children = child.children.split_off(mid + 1);
        }

        self.keys.insert(idx, sep_key);
        self.values.insert(idx, sep_value);
        self.children.insert(idx + 1, Box::new(right));
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a K, &'a V)) {
        for i in 0..self.keys.len() {
            if !self.is_leaf {
                self.children[i].walk(visit);
            }
            visit(&self.keys[i], &self.values[i]);
        }
        if !self.is_leaf {
            if let Some(last) = self.children.last() {
                last.walk(visit);
            }
        }
    }
}

/// Ordered key → value index backed by a multiway B-tree.
#[derive(Debug, Clone)]
pub struct BTree<K, V> {
    root: Box<Node<K, V>>,
    order: usize,
    len: usize,
}

impl<K: Codec + Ord + Clone, V: Codec + Clone> BTree<K, V> {
    /// Creates an empty tree with the given fan-out (maximum keys per
    /// node). Orders below [`MIN_ORDER`] are clamped.
    pub fn new(order: usize) -> Self {
        Self {
            root: Box::new(Node::new(true)),
            order: order.max(MIN_ORDER),
            len: 0,
        }
    }

    /// Point lookup. Absent key is `None`, not an error.
    pub fn find(&self, key: &K) -> Option<&V> {
        self.root.search(key)
    }

    /// Inserts a new key. Fails with `DuplicateKey` if the key exists;
    /// callers that need upsert must `find` first.
    pub fn insert(&mut self, key: K, value: V) -> Result<()>
    where
        K: std::fmt::Debug,
    {
        if self.root.search(&key).is_some() {
            return Err(StoreError::DuplicateKey(format!("{key:?}")));
        }

        if self.root.is_full(self.order) {
            let old_root = std::mem::replace(&mut self.root, Box::new(Node::new(false)));
            self.root.children.push(old_root);
            self.root.split_child(0, self.order);
        }
        self.root.insert_non_full(key, value, self.order);
        self.len += 1;
        Ok(())
    }

    /// Replaces the value of an existing key. Fails with `NotFound` if
    /// the key is absent.
    pub fn update(&mut self, key: &K, value: V) -> Result<()> {
        match self.root.search_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::NotFound("index key")),
        }
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len);
        self.root.walk(&mut |k, _| out.push(k.clone()));
        out
    }

    /// All values in ascending key order.
    pub fn values(&self) -> Vec<V> {
        let mut out = Vec::with_capacity(self.len);
        self.root.walk(&mut |_, v| out.push(v.clone()));
        out
    }

    /// All entries in ascending key order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.len);
        self.root.walk(&mut |k, v| out.push((k.clone(), v.clone())));
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Encodes the full tree: header, then entries in key order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(INDEX_HEADER_SIZE + self.len * 16);
        buf.extend_from_slice(INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // reserved
        buf.extend_from_slice(&(self.order as u32).to_le_bytes());
        buf.extend_from_slice(&(self.len as u64).to_le_bytes());
        self.root.walk(&mut |k, v| {
            k.encode(&mut buf);
            v.encode(&mut buf);
        });
        buf
    }

    /// Rebuilds a tree from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < INDEX_HEADER_SIZE || &data[..INDEX_MAGIC.len()] != INDEX_MAGIC {
            return Err(StoreError::CorruptRecord(
                "index file missing magic header".into(),
            ));
        }
        let mut cursor = INDEX_MAGIC.len();
        let version = u16::from_le_bytes(
            take(data, &mut cursor, 2)?
                .try_into()
                .map_err(|_| StoreError::CorruptRecord("invalid index version".into()))?,
        );
        if version != INDEX_VERSION {
            return Err(StoreError::CorruptRecord(format!(
                "unsupported index format version {version}"
            )));
        }
        cursor += 2; // reserved
        let order = read_u32(data, &mut cursor)? as usize;
        let count = read_u64(data, &mut cursor)?;

        let mut tree = Self::new(order);
        for _ in 0..count {
            let key = K::decode(data, &mut cursor)?;
            let value = V::decode(data, &mut cursor)?;
            tree.insert_loaded(key, value);
        }
        Ok(tree)
    }

    /// Persists the tree to a single file, fsynced.
    pub fn serialize(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Restores a tree from `path`. A missing file yields an empty tree
    /// with fan-out `order`.
    pub fn load(path: &Path, order: usize) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(order));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    // Insert during load: keys arrive sorted and unique, skip the
    // duplicate probe.
    fn insert_loaded(&mut self, key: K, value: V) {
        if self.root.is_full(self.order) {
            let old_root = std::mem::replace(&mut self.root, Box::new(Node::new(false)));
            self.root.children.push(old_root);
            self.root.split_child(0, self.order);
        }
        self.root.insert_non_full(key, value, self.order);
        self.len += 1;
    }
}
