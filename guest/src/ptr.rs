//! Opaque guest pointers and the values exchanged with guest exports

use std::fmt;

/// An offset into a guest module's linear memory.
///
/// This is not a host pointer; it only has meaning to the module that handed it
/// out. Offset zero is the null pointer and never refers to valid storage.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct GuestPtr(u32);

impl GuestPtr {
    /// The null pointer, returned by a guest allocator on failure
    pub const NULL: Self = Self(0);

    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    /// Reinterpret an `i32` as produced by a wasm32 export
    pub const fn from_i32(raw: i32) -> Self {
        Self(raw as u32)
    }

    pub const fn offset(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Host index of the first byte
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for GuestPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuestPtr({:#x})", self.0)
    }
}

impl fmt::Display for GuestPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A value passed to or returned from a guest export
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Val {
    I32(i32),
    I64(i64),
}

impl Val {
    pub fn as_i32(self) -> Option<i32> {
        match self {
            Val::I32(v) => Some(v),
            Val::I64(_) => None,
        }
    }

    /// Encode a length for a 32 bit guest; `None` if it does not fit
    pub fn from_len(len: usize) -> Option<Self> {
        u32::try_from(len).ok().map(Self::from)
    }
}

impl From<GuestPtr> for Val {
    fn from(ptr: GuestPtr) -> Self {
        Val::I32(ptr.0 as i32)
    }
}

impl From<i32> for Val {
    fn from(v: i32) -> Self {
        Val::I32(v)
    }
}

/// Guests see unsigned 32 bit values as `i32` with the same bit pattern
impl From<u32> for Val {
    fn from(v: u32) -> Self {
        Val::I32(v as i32)
    }
}

impl From<i64> for Val {
    fn from(v: i64) -> Self {
        Val::I64(v)
    }
}

impl From<bool> for Val {
    fn from(v: bool) -> Self {
        Val::I32(v as i32)
    }
}
