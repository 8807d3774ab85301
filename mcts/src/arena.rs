//! Chunked bump arena for search nodes
//!
//! A search allocates nodes continuously and frees them all at once when
//! it returns, so nodes come from an arena rather than individual boxes.
//! Values are stored in fixed-capacity chunks that never reallocate, which
//! keeps every handed-out reference (and therefore pointer identity)
//! stable for the arena's lifetime. Allocation takes a short mutex; reads
//! go through the returned references and take no lock at all.

use parking_lot::Mutex;

/// Values per chunk. Allocation locks once per node, so the chunk size
/// only tunes allocator pressure.
const CHUNK_CAPACITY: usize = 1024;

/// A typed bump arena. Dropping the arena drops every allocated value.
pub struct Arena<T> {
    chunks: Mutex<Vec<Vec<T>>>,
}

impl<T> Arena<T> {
    pub fn new() -> Arena<T> {
        Arena {
            chunks: Mutex::new(Vec::new()),
        }
    }

    /// Move `value` into the arena and return a reference that lives as
    /// long as the arena does.
    pub fn alloc(&self, value: T) -> &T {
        let mut chunks = self.chunks.lock();
        let needs_chunk = chunks
            .last()
            .map(|chunk| chunk.len() == CHUNK_CAPACITY)
            .unwrap_or(true);
        if needs_chunk {
            chunks.push(Vec::with_capacity(CHUNK_CAPACITY));
        }
        let chunk = chunks.last_mut().expect("chunk pushed above");
        chunk.push(value);
        let ptr: *const T = chunk.last().expect("value pushed above");
        // Chunks never grow past their initial capacity and are never
        // shrunk or dropped before the arena itself, so the address is
        // stable; the lifetime is tied to &self.
        unsafe { &*ptr }
    }

    /// Number of values allocated so far.
    pub fn len(&self) -> usize {
        let chunks = self.chunks.lock();
        chunks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new()
    }
}
