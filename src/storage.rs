//! Pluggable storage containers.
//!
//! The scheduler never names a concrete collection type. It asks a [`ContainerFactory`]
//! for maps, sets and queues, and only uses the small operation sets defined by the
//! container traits below: insert, membership test, non-blocking pop-or-empty, removal.
//! That keeps the core independent of where its state lives.
//!
//! Two in-memory backends ship with the crate:
//!
//! - [`LocalStorage`]: `HashMap` / `HashSet` / `VecDeque` / `Vec`
//! - [`OrderedStorage`]: `IndexMap` / `IndexSet`, so that iteration (and therefore the
//!   order in which simultaneously-ready tasks are queued) follows insertion order

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// Key-value container.
pub trait MapContainer<K, V> {
    fn insert(&mut self, key: K, value: V) -> Option<V>;
    fn get(&self, key: &K) -> Option<&V>;
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;
    fn remove(&mut self, key: &K) -> Option<V>;
    fn len(&self) -> usize;

    fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unordered collection of distinct values.
pub trait SetContainer<T> {
    /// Returns `false` if the value was already present.
    fn insert(&mut self, value: T) -> bool;
    fn remove(&mut self, value: &T) -> bool;
    fn contains(&self, value: &T) -> bool;
    fn len(&self) -> usize;
    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// FIFO queue. `pop` never blocks; an empty queue yields `None`.
pub trait QueueContainer<T> {
    fn push(&mut self, value: T);
    fn pop(&mut self) -> Option<T>;
    fn len(&self) -> usize;
    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a;

    fn retain(&mut self, keep: impl FnMut(&T) -> bool);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Indexed sequence. Part of the factory contract, not used by the scheduler core.
pub trait ListContainer<T> {
    fn push(&mut self, value: T);
    fn get(&self, index: usize) -> Option<&T>;
    fn len(&self) -> usize;
    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Supplies the four primitive containers the scheduler is built from.
///
/// A backend is selected explicitly through
/// [`DispatcherConfig`](crate::DispatcherConfig); there is no process-wide default.
///
/// # Examples
///
/// ```
/// use reqx::storage::{ContainerFactory, LocalStorage, QueueContainer};
///
/// let mut queue = LocalStorage.make_queue::<u32>();
/// queue.push(1);
/// queue.push(2);
/// assert_eq!(queue.pop(), Some(1));
/// assert_eq!(queue.pop(), Some(2));
/// assert_eq!(queue.pop(), None);
/// ```
pub trait ContainerFactory {
    type Map<K: Hash + Eq, V>: MapContainer<K, V>;
    type Set<T: Hash + Eq>: SetContainer<T>;
    type Queue<T>: QueueContainer<T>;
    type List<T>: ListContainer<T>;

    fn make_map<K: Hash + Eq, V>(&self) -> Self::Map<K, V>;
    fn make_set<T: Hash + Eq>(&self) -> Self::Set<T>;
    fn make_queue<T>(&self) -> Self::Queue<T>;
    fn make_list<T>(&self) -> Self::List<T>;
}

/// Standard-library hash containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalStorage;

/// Insertion-ordered containers backed by `indexmap`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderedStorage;

impl ContainerFactory for LocalStorage {
    type Map<K: Hash + Eq, V> = HashMap<K, V>;
    type Set<T: Hash + Eq> = HashSet<T>;
    type Queue<T> = VecDeque<T>;
    type List<T> = Vec<T>;

    fn make_map<K: Hash + Eq, V>(&self) -> Self::Map<K, V> {
        HashMap::new()
    }

    fn make_set<T: Hash + Eq>(&self) -> Self::Set<T> {
        HashSet::new()
    }

    fn make_queue<T>(&self) -> Self::Queue<T> {
        VecDeque::new()
    }

    fn make_list<T>(&self) -> Self::List<T> {
        Vec::new()
    }
}

impl ContainerFactory for OrderedStorage {
    type Map<K: Hash + Eq, V> = IndexMap<K, V>;
    type Set<T: Hash + Eq> = IndexSet<T>;
    type Queue<T> = VecDeque<T>;
    type List<T> = Vec<T>;

    fn make_map<K: Hash + Eq, V>(&self) -> Self::Map<K, V> {
        IndexMap::new()
    }

    fn make_set<T: Hash + Eq>(&self) -> Self::Set<T> {
        IndexSet::new()
    }

    fn make_queue<T>(&self) -> Self::Queue<T> {
        VecDeque::new()
    }

    fn make_list<T>(&self) -> Self::List<T> {
        Vec::new()
    }
}

impl<K: Hash + Eq, V> MapContainer<K, V> for HashMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        HashMap::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        HashMap::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        HashMap::get_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        HashMap::remove(self, key)
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn contains_key(&self, key: &K) -> bool {
        HashMap::contains_key(self, key)
    }
}

impl<K: Hash + Eq, V> MapContainer<K, V> for IndexMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        IndexMap::insert(self, key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        IndexMap::get(self, key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        IndexMap::get_mut(self, key)
    }

    // shift_remove keeps the remaining entries in insertion order
    fn remove(&mut self, key: &K) -> Option<V> {
        IndexMap::shift_remove(self, key)
    }

    fn len(&self) -> usize {
        IndexMap::len(self)
    }

    fn contains_key(&self, key: &K) -> bool {
        IndexMap::contains_key(self, key)
    }
}

impl<T: Hash + Eq> SetContainer<T> for HashSet<T> {
    fn insert(&mut self, value: T) -> bool {
        HashSet::insert(self, value)
    }

    fn remove(&mut self, value: &T) -> bool {
        HashSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        HashSet::contains(self, value)
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        HashSet::iter(self)
    }
}

impl<T: Hash + Eq> SetContainer<T> for IndexSet<T> {
    fn insert(&mut self, value: T) -> bool {
        IndexSet::insert(self, value)
    }

    fn remove(&mut self, value: &T) -> bool {
        IndexSet::shift_remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        IndexSet::contains(self, value)
    }

    fn len(&self) -> usize {
        IndexSet::len(self)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        IndexSet::iter(self)
    }
}

impl<T> QueueContainer<T> for VecDeque<T> {
    fn push(&mut self, value: T) {
        self.push_back(value);
    }

    fn pop(&mut self) -> Option<T> {
        self.pop_front()
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        VecDeque::iter(self)
    }

    fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        VecDeque::retain(self, keep);
    }
}

impl<T> ListContainer<T> for Vec<T> {
    fn push(&mut self, value: T) {
        Vec::push(self, value);
    }

    fn get(&self, index: usize) -> Option<&T> {
        <[T]>::get(self, index)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        <[T]>::iter(self)
    }
}
