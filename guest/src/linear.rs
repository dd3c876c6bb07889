//! A linear memory with a C style allocator, for guests that run on the host
//!
//! Host-side guests (and test doubles) use [LinearMemory] so that pointers, null
//! returns on exhaustion and stale data after `free` behave like they do inside a
//! real wasm32 module.

use std::collections::{BTreeMap, HashMap};

use crate::{GuestError, GuestModule, GuestPtr, HeapStats, Val};

/// Size of one page of linear memory, as in WebAssembly
pub const PAGE_SIZE: usize = 64 * 1024;

/// Alignment of every allocation
pub const ALIGN: u32 = 16;

/// Offsets below this are never handed out, so offset zero stays the null pointer
pub const HEAP_BASE: u32 = 16;

/// Byte addressable memory plus a first-fit allocator living inside it
#[derive(Debug)]
pub struct LinearMemory {
    bytes: Vec<u8>,
    max_len: usize,
    /// offset -> size of each free block; adjacent blocks are always merged
    free: BTreeMap<u32, u32>,
    /// offset -> size of each live allocation
    live: HashMap<u32, u32>,
    stats: HeapStats,
}

impl LinearMemory {
    /// Memory starting out with `initial_pages`, allowed to grow to `max_pages`
    pub fn new(initial_pages: usize, max_pages: usize) -> Self {
        let max_pages = max_pages.max(initial_pages).max(1);
        // wasm32 can not address more than 4 GiB
        let max_len = (max_pages * PAGE_SIZE).min(u32::MAX as usize - PAGE_SIZE + 1);
        let initial_len = (initial_pages.max(1) * PAGE_SIZE).min(max_len);

        let mut mem = Self {
            bytes: vec![0u8; initial_len],
            max_len,
            free: BTreeMap::new(),
            live: HashMap::new(),
            stats: HeapStats::default(),
        };
        mem.insert_free(HEAP_BASE, initial_len as u32 - HEAP_BASE);
        mem
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Size of the live allocation at `ptr`, if there is one
    pub fn allocation_len(&self, ptr: GuestPtr) -> Option<usize> {
        self.live.get(&ptr.offset()).map(|&size| size as usize)
    }

    /// Allocate `len` bytes; returns [GuestPtr::NULL] if memory is exhausted
    pub fn malloc(&mut self, len: usize) -> GuestPtr {
        let Some(size) = Self::block_size(len) else {
            return GuestPtr::NULL;
        };

        let block = match self.take_first_fit(size) {
            Some(block) => block,
            None => {
                if !self.grow_for(size) {
                    log::debug!("linear memory exhausted, refusing allocation of {len} bytes");
                    return GuestPtr::NULL;
                }
                match self.take_first_fit(size) {
                    Some(block) => block,
                    None => return GuestPtr::NULL,
                }
            }
        };

        self.live.insert(block, size);
        self.stats.live_allocations += 1;
        self.stats.live_bytes += size as usize;
        self.stats.peak_bytes = self.stats.peak_bytes.max(self.stats.live_bytes);
        self.stats.total_allocations += 1;
        GuestPtr::new(block)
    }

    /// Return an allocation to the free list. The contents are left as they are.
    pub fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        if ptr.is_null() {
            return Ok(());
        }
        let size = self
            .live
            .remove(&ptr.offset())
            .ok_or(GuestError::InvalidFree(ptr))?;
        self.stats.live_allocations -= 1;
        self.stats.live_bytes -= size as usize;
        self.insert_free(ptr.offset(), size);
        Ok(())
    }

    fn block_size(len: usize) -> Option<u32> {
        let len = u32::try_from(len.max(1)).ok()?;
        len.checked_add(ALIGN - 1).map(|l| l & !(ALIGN - 1))
    }

    fn take_first_fit(&mut self, size: u32) -> Option<u32> {
        let (offset, available) = self
            .free
            .iter()
            .find(|(_, &available)| available >= size)
            .map(|(&o, &a)| (o, a))?;
        self.free.remove(&offset);
        if available > size {
            // Neighbours of the remainder are allocated or the end of memory
            self.free.insert(offset + size, available - size);
        }
        Some(offset)
    }

    fn grow_for(&mut self, size: u32) -> bool {
        let pages = (size as usize).div_ceil(PAGE_SIZE);
        let old_len = self.bytes.len();
        let new_len = match old_len.checked_add(pages * PAGE_SIZE) {
            Some(l) if l <= self.max_len => l,
            _ => return false,
        };
        self.bytes.resize(new_len, 0);
        self.insert_free(old_len as u32, (new_len - old_len) as u32);
        true
    }

    fn insert_free(&mut self, mut offset: u32, mut size: u32) {
        if let Some((&prev, &prev_size)) = self.free.range(..offset).next_back() {
            if prev + prev_size == offset {
                self.free.remove(&prev);
                offset = prev;
                size += prev_size;
            }
        }
        if let Some(next_size) = self.free.remove(&(offset + size)) {
            size += next_size;
        }
        self.free.insert(offset, size);
    }
}

/// A bare memory is a module without any exports besides its allocator
impl GuestModule for LinearMemory {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        Ok(LinearMemory::malloc(self, len))
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        LinearMemory::free(self, ptr)
    }

    fn memory(&self) -> &[u8] {
        &self.bytes
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn call(&mut self, function: &str, _args: &[Val]) -> Result<Option<Val>, GuestError> {
        Err(GuestError::MissingExport(function.to_owned()))
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        Some(self.stats)
    }
}

impl Default for LinearMemory {
    /// One page to start with, up to 16 MiB
    fn default() -> Self {
        Self::new(1, 256)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn never_hands_out_null() {
        let mut mem = LinearMemory::default();
        let first = mem.malloc(0);
        assert!(!first.is_null());
        assert_eq!(first.offset(), HEAP_BASE);
        assert_eq!(first.offset() % ALIGN, 0);
    }

    #[test]
    fn allocations_are_aligned_and_disjoint() {
        let mut mem = LinearMemory::default();
        let a = mem.malloc(3);
        let b = mem.malloc(17);
        let c = mem.malloc(1);
        assert_eq!(b.offset() - a.offset(), 16);
        assert_eq!(c.offset() - b.offset(), 32);
        assert_eq!(mem.allocation_len(b), Some(32));
        assert_eq!(mem.stats().live_allocations, 3);
        assert_eq!(mem.stats().live_bytes, 64);
    }

    #[test]
    fn free_blocks_are_reused_and_merged() {
        let mut mem = LinearMemory::default();
        let a = mem.malloc(32);
        let b = mem.malloc(32);
        let c = mem.malloc(32);
        mem.free(a).unwrap();
        mem.free(b).unwrap();

        // a and b merged into one 64 byte hole in front of c
        let d = mem.malloc(64);
        assert_eq!(d, a);

        mem.free(c).unwrap();
        mem.free(d).unwrap();
        assert_eq!(mem.stats().live_allocations, 0);
        assert_eq!(mem.stats().live_bytes, 0);
        assert_eq!(mem.stats().peak_bytes, 96);
        assert_eq!(mem.free.len(), 1);
    }

    #[test]
    fn free_leaves_contents_behind() {
        let mut mem = LinearMemory::default();
        let a = mem.malloc(4);
        mem.bytes_mut()[a.index()..a.index() + 4].copy_from_slice(b"key!");
        mem.free(a).unwrap();
        assert_eq!(&mem.bytes()[a.index()..a.index() + 4], b"key!");
    }

    #[test]
    fn double_free_is_reported() {
        let mut mem = LinearMemory::default();
        let a = mem.malloc(8);
        mem.free(a).unwrap();
        assert!(matches!(mem.free(a), Err(GuestError::InvalidFree(p)) if p == a));
        assert!(mem.free(GuestPtr::NULL).is_ok());
        assert!(mem.free(GuestPtr::new(12345)).is_err());
    }

    #[test]
    fn grows_until_the_limit_then_returns_null() {
        let mut mem = LinearMemory::new(1, 2);
        let big = mem.malloc(PAGE_SIZE);
        assert!(!big.is_null());
        assert_eq!(mem.bytes().len(), 2 * PAGE_SIZE);

        assert!(mem.malloc(PAGE_SIZE).is_null());
        mem.free(big).unwrap();
        assert!(!mem.malloc(PAGE_SIZE).is_null());
    }
}
