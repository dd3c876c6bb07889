//! Scoped ownership of guest allocations
//!
//! Every allocation made through a [GuestScope] is released exactly once when the
//! scope ends, no matter whether the operation using it succeeded, returned an
//! error or bailed out early through `?`. Allocations made with one of the
//! `*_secure` functions are overwritten with zeros before they are freed.

use crate::{GuestError, GuestMemoryExt, GuestModule, GuestPtr, Val};

/// A plain region of guest memory owned by a [GuestScope]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GuestBuffer {
    ptr: GuestPtr,
    len: usize,
}

/// A region of guest memory holding secret material; zeroed before it is freed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SecureGuestBuffer(GuestBuffer);

/// Common view on [GuestBuffer] and [SecureGuestBuffer]
pub trait GuestRegion {
    fn region(&self) -> GuestBuffer;

    fn ptr(&self) -> GuestPtr {
        self.region().ptr
    }

    fn len(&self) -> usize {
        self.region().len
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The pointer, ready to be passed to a guest export
    fn val(&self) -> Val {
        self.ptr().into()
    }
}

impl GuestRegion for GuestBuffer {
    fn region(&self) -> GuestBuffer {
        *self
    }
}

impl GuestRegion for SecureGuestBuffer {
    fn region(&self) -> GuestBuffer {
        self.0
    }
}

/// Cleanup work owed to the guest
#[derive(Debug)]
enum Release {
    Free {
        ptr: GuestPtr,
        len: usize,
        secure: bool,
    },
    Destroy {
        function: &'static str,
        handle: GuestPtr,
    },
}

/// Owns allocations (and other handles) inside a guest for the duration of one
/// operation. Releases happen in reverse order of acquisition.
pub struct GuestScope<'m, M: GuestModule + ?Sized> {
    module: &'m mut M,
    pending: Vec<Release>,
}

impl<'m, M: GuestModule + ?Sized> GuestScope<'m, M> {
    pub fn new(module: &'m mut M) -> Self {
        Self {
            module,
            pending: Vec::new(),
        }
    }

    /// The underlying module, e.g. to run a nested [crate::invoke]
    pub fn module(&mut self) -> &mut M {
        &mut *self.module
    }

    /// Allocate a plain buffer of `len` bytes
    pub fn alloc(&mut self, len: usize) -> Result<GuestBuffer, GuestError> {
        self.allocate(len, false)
    }

    /// Allocate a buffer for secret material of `len` bytes
    pub fn alloc_secure(&mut self, len: usize) -> Result<SecureGuestBuffer, GuestError> {
        self.allocate(len, true).map(SecureGuestBuffer)
    }

    /// Allocate a plain buffer and copy `data` into it
    pub fn alloc_copy(&mut self, data: &[u8]) -> Result<GuestBuffer, GuestError> {
        let buf = self.alloc(data.len())?;
        self.write(&buf, data)?;
        Ok(buf)
    }

    /// Allocate a secret buffer and copy `data` into it
    pub fn alloc_secure_copy(&mut self, data: &[u8]) -> Result<SecureGuestBuffer, GuestError> {
        let buf = self.alloc_secure(data.len())?;
        self.write(&buf, data)?;
        Ok(buf)
    }

    /// Allocate a null terminated copy of `text`. Strings are zeroed on release.
    pub fn alloc_cstr(&mut self, text: &str) -> Result<SecureGuestBuffer, GuestError> {
        let bytes = text.as_bytes();
        let buf = self.alloc_secure(bytes.len() + 1)?;
        let dst = self.module.read_mut(buf.ptr(), buf.len())?;
        dst[..bytes.len()].copy_from_slice(bytes);
        dst[bytes.len()] = 0;
        Ok(buf)
    }

    /// Copy `data` to the start of `buf`
    pub fn write<R: GuestRegion>(&mut self, buf: &R, data: &[u8]) -> Result<(), GuestError> {
        self.check_fits(buf, data.len())?;
        self.module.write(buf.ptr(), data)
    }

    /// Borrow the contents of `buf`
    pub fn read<R: GuestRegion>(&self, buf: &R) -> Result<&[u8], GuestError> {
        self.module.read(buf.ptr(), buf.len())
    }

    /// Copy the start of `buf` out into host memory owned by the caller
    pub fn read_into<R: GuestRegion>(&self, buf: &R, out: &mut [u8]) -> Result<(), GuestError> {
        self.check_fits(buf, out.len())?;
        out.copy_from_slice(self.module.read(buf.ptr(), out.len())?);
        Ok(())
    }

    pub fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        log::trace!("calling guest export {function}{args:?}");
        self.module.call(function, args)
    }

    pub fn call_i32(&mut self, function: &str, args: &[Val]) -> Result<i32, GuestError> {
        log::trace!("calling guest export {function}{args:?}");
        self.module.call_i32(function, args)
    }

    /// Make the scope call `function(handle)` when it ends, e.g. to destroy a context
    /// object the guest allocated on its own
    pub fn defer_destroy(&mut self, function: &'static str, handle: GuestPtr) {
        self.pending.push(Release::Destroy { function, handle });
    }

    /// End the scope, reporting the first error that happened during cleanup.
    ///
    /// Cleanup continues past errors, so every allocation gets its `free` call.
    pub fn release(mut self) -> Result<(), GuestError> {
        self.release_all()
    }

    fn allocate(&mut self, len: usize, secure: bool) -> Result<GuestBuffer, GuestError> {
        let ptr = self.module.malloc(len)?;
        if ptr.is_null() {
            return Err(GuestError::AllocationFailure { len });
        }
        self.pending.push(Release::Free { ptr, len, secure });

        // A misbehaving guest could hand out memory it does not have
        self.module.read(ptr, len)?;

        log::trace!("allocated {len} bytes at {ptr} (secure: {secure})");
        Ok(GuestBuffer { ptr, len })
    }

    fn check_fits<R: GuestRegion>(&self, buf: &R, len: usize) -> Result<(), GuestError> {
        match len <= buf.len() {
            true => Ok(()),
            false => Err(GuestError::OutOfBounds {
                ptr: buf.ptr(),
                len,
                memory_len: self.module.memory().len(),
            }),
        }
    }

    fn release_all(&mut self) -> Result<(), GuestError> {
        let mut first_error = None;
        while let Some(item) = self.pending.pop() {
            let res = match item {
                Release::Free { ptr, len, secure } => {
                    let zeroed = match secure {
                        true => self.module.fill(ptr, len, 0),
                        false => Ok(()),
                    };
                    // Free regardless; a failed zeroing is still reported below
                    let freed = self.module.free(ptr);
                    zeroed.and(freed)
                }
                Release::Destroy { function, handle } => {
                    self.module.call(function, &[handle.into()]).map(|_| ())
                }
            };

            if let Err(e) = res {
                match first_error {
                    None => first_error = Some(e),
                    Some(_) => log::warn!("further error while releasing guest resources: {e}"),
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl<M: GuestModule + ?Sized> Drop for GuestScope<'_, M> {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            log::error!("failed to release guest resources: {e}");
        }
    }
}
