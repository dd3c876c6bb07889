//! The capability set a sandboxed module offers to its host

use crate::{GuestError, GuestPtr, Val};

/// Snapshot of a guest allocator's bookkeeping
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Allocations that have not been freed yet
    pub live_allocations: usize,
    /// Bytes held by live allocations, including alignment padding
    pub live_bytes: usize,
    /// Highest value `live_bytes` ever reached
    pub peak_bytes: usize,
    /// Number of successful allocations over the module's lifetime
    pub total_allocations: u64,
}

/// A sandboxed module with a flat C ABI and its own linear memory.
///
/// Implementations are not re-entrant: the allocator state lives inside the module,
/// so callers sharing one instance must serialize access (see [crate::SharedGuest]).
pub trait GuestModule {
    /// Call the module's `malloc`. May return [GuestPtr::NULL]; callers must check.
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError>;

    /// Call the module's `free`. Freeing [GuestPtr::NULL] is a no-op.
    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError>;

    /// The module's linear memory
    fn memory(&self) -> &[u8];

    /// The module's linear memory
    fn memory_mut(&mut self) -> &mut [u8];

    /// Call any other export
    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError>;

    /// Allocator bookkeeping, if the module exposes it
    fn heap_stats(&self) -> Option<HeapStats> {
        None
    }

    /// Call an export that returns exactly one `i32`, such as a status code
    fn call_i32(&mut self, function: &str, args: &[Val]) -> Result<i32, GuestError> {
        match self.call(function, args)? {
            Some(Val::I32(v)) => Ok(v),
            actual => Err(GuestError::UnexpectedResult {
                function: function.to_owned(),
                actual,
            }),
        }
    }
}

impl<M: GuestModule + ?Sized> GuestModule for &mut M {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        (**self).malloc(len)
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        (**self).free(ptr)
    }

    fn memory(&self) -> &[u8] {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        (**self).memory_mut()
    }

    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        (**self).call(function, args)
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        (**self).heap_stats()
    }
}

impl<M: GuestModule + ?Sized> GuestModule for Box<M> {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        (**self).malloc(len)
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        (**self).free(ptr)
    }

    fn memory(&self) -> &[u8] {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        (**self).memory_mut()
    }

    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        (**self).call(function, args)
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        (**self).heap_stats()
    }
}

/// Bounds checked access to a guest's linear memory
pub trait GuestMemoryExt {
    /// Borrow `len` bytes at `ptr`
    fn read(&self, ptr: GuestPtr, len: usize) -> Result<&[u8], GuestError>;

    /// Borrow `len` bytes at `ptr` mutably
    fn read_mut(&mut self, ptr: GuestPtr, len: usize) -> Result<&mut [u8], GuestError>;

    /// Copy `data` to `ptr`
    fn write(&mut self, ptr: GuestPtr, data: &[u8]) -> Result<(), GuestError> {
        self.read_mut(ptr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Overwrite `len` bytes at `ptr` with `byte`
    fn fill(&mut self, ptr: GuestPtr, len: usize, byte: u8) -> Result<(), GuestError> {
        self.read_mut(ptr, len)?.fill(byte);
        Ok(())
    }

    /// Borrow the null terminated string at `ptr`, without the terminator
    fn read_cstr(&self, ptr: GuestPtr) -> Result<&[u8], GuestError>;
}

fn region(memory_len: usize, ptr: GuestPtr, len: usize) -> Result<std::ops::Range<usize>, GuestError> {
    let oob = || GuestError::OutOfBounds {
        ptr,
        len,
        memory_len,
    };
    if ptr.is_null() {
        return Err(oob());
    }
    let end = ptr.index().checked_add(len).ok_or_else(oob)?;
    match end <= memory_len {
        true => Ok(ptr.index()..end),
        false => Err(oob()),
    }
}

impl<M: GuestModule + ?Sized> GuestMemoryExt for M {
    fn read(&self, ptr: GuestPtr, len: usize) -> Result<&[u8], GuestError> {
        let memory = self.memory();
        let range = region(memory.len(), ptr, len)?;
        Ok(&memory[range])
    }

    fn read_mut(&mut self, ptr: GuestPtr, len: usize) -> Result<&mut [u8], GuestError> {
        let memory = self.memory_mut();
        let range = region(memory.len(), ptr, len)?;
        Ok(&mut memory[range])
    }

    fn read_cstr(&self, ptr: GuestPtr) -> Result<&[u8], GuestError> {
        let memory = self.memory();
        let tail = &memory[region(memory.len(), ptr, 0)?.start..];
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(GuestError::OutOfBounds {
                ptr,
                len: tail.len() + 1,
                memory_len: memory.len(),
            })?;
        Ok(&tail[..len])
    }
}
