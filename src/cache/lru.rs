//! LRU Entry List Module
//!
//! Doubly-linked list of cache entries ordered from least to most recently used.

// == Entry Handle ==
/// Opaque handle to an entry stored in an [`EntryList`].
///
/// Handles stay valid until the entry is evicted or the list is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

// == Entry ==
/// One cached binding plus its position links.
#[derive(Debug)]
struct Entry<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Entry List ==
/// Recency-ordered list of entries.
///
/// Entries live in a slot vector and link to each other by slot index:
/// - Head = Least recently used (eviction candidate)
/// - Tail = Most recently used
///
/// Freed slots are reused, so storage never grows past the peak entry count.
#[derive(Debug)]
pub struct EntryList<V> {
    slots: Vec<Option<Entry<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<V> Default for EntryList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EntryList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates a new empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Append ==
    /// Links a new entry as the most recently used one and returns its handle.
    ///
    /// The caller guarantees `key` is not already in the list.
    pub fn append_most_recent(&mut self, key: String, value: V) -> EntryId {
        let entry = Entry {
            key,
            value,
            prev: self.tail,
            next: None,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.entry_mut(tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;

        EntryId(idx)
    }

    // == Promote ==
    /// Moves an existing entry to the most recently used position.
    ///
    /// # Panics
    /// Panics if the list is empty or `id` does not refer to a live entry.
    /// Either case means the caller's index and this list disagree.
    pub fn promote_to_most_recent(&mut self, id: EntryId) {
        assert!(self.len > 0, "promote_to_most_recent called on an empty list");
        let idx = id.0;
        let (prev, next) = {
            let entry = self.entry(idx);
            (entry.prev, entry.next)
        };

        if self.tail == Some(idx) {
            return;
        }

        // Not the tail, so `next` is always set here.
        let Some(next) = next else {
            panic!("entry {idx} has no successor but is not the tail");
        };

        match prev {
            // Head: the successor becomes the new head.
            None => {
                self.head = Some(next);
                self.entry_mut(next).prev = None;
            }
            // Interior: link the neighbours to each other.
            Some(prev) => {
                self.entry_mut(prev).next = Some(next);
                self.entry_mut(next).prev = Some(prev);
            }
        }

        let old_tail = self.tail;
        {
            let entry = self.entry_mut(idx);
            entry.prev = old_tail;
            entry.next = None;
        }
        if let Some(old_tail) = old_tail {
            self.entry_mut(old_tail).next = Some(idx);
        }
        self.tail = Some(idx);
    }

    // == Evict ==
    /// Unlinks the least recently used entry and returns its key.
    ///
    /// # Panics
    /// Panics if the list is empty.
    pub fn evict_least_recent(&mut self) -> String {
        assert!(self.len > 0, "evict_least_recent called on an empty list");
        let Some(head) = self.head else {
            panic!("list of length {} has no head", self.len);
        };

        let Some(entry) = self.slots[head].take() else {
            panic!("head slot {head} is vacant");
        };
        self.free.push(head);

        self.head = entry.next;
        match entry.next {
            Some(next) => self.entry_mut(next).prev = None,
            None => self.tail = None,
        }
        self.len -= 1;

        entry.key
    }

    // == Clear ==
    /// Drops every entry. All outstanding handles become invalid.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Accessors ==
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the least recently used entry, if any.
    pub fn head(&self) -> Option<EntryId> {
        self.head.map(EntryId)
    }

    /// Returns the most recently used entry, if any.
    pub fn tail(&self) -> Option<EntryId> {
        self.tail.map(EntryId)
    }

    /// Returns the key stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` does not refer to a live entry.
    pub fn key(&self, id: EntryId) -> &str {
        &self.entry(id.0).key
    }

    /// Returns the value stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` does not refer to a live entry.
    pub fn value(&self, id: EntryId) -> &V {
        &self.entry(id.0).value
    }

    /// Returns a mutable reference to the value stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` does not refer to a live entry.
    pub fn value_mut(&mut self, id: EntryId) -> &mut V {
        &mut self.entry_mut(id.0).value
    }

    /// Iterates keys from least to most recently used.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn entry(&self, idx: usize) -> &Entry<V> {
        match self.slots.get(idx) {
            Some(Some(entry)) => entry,
            _ => panic!("entry slot {idx} is not live"),
        }
    }

    fn entry_mut(&mut self, idx: usize) -> &mut Entry<V> {
        match self.slots.get_mut(idx) {
            Some(Some(entry)) => entry,
            _ => panic!("entry slot {idx} is not live"),
        }
    }
}

// == Key Iterator ==
/// Iterator over keys in recency order, head first.
pub struct Keys<'a, V> {
    list: &'a EntryList<V>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let entry = self.list.entry(idx);
        self.cursor = entry.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&entry.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
