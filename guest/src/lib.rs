//! Marshalling between the host and sandboxed guest modules
//!
//! A guest is a module (typically WebAssembly) with its own linear memory and a flat C
//! ABI: `malloc`, `free` and algorithm specific exports that only accept integers.
//! Handing it a byte string means allocating guest memory, copying the bytes in,
//! passing the offset, and releasing the allocation afterwards – on every path,
//! including the error paths, and with secrets overwritten before they are freed.
//!
//! - [GuestModule] is the capability set a guest offers
//! - [GuestScope] owns allocations for the duration of one operation
//! - [invoke] calls an export with mixed host [Arg]uments
//! - [SharedGuest] loads a guest once and serializes access to it
//! - [LinearMemory] is a linear memory plus allocator for guests running on the host

pub mod abi;
mod error;
mod invoke;
pub mod linear;
mod module;
mod ptr;
mod scope;
mod shared;

#[cfg(any(test, feature = "stub"))]
pub mod stub;

pub use error::GuestError;
pub use invoke::{invoke, invoke_i32, Arg};
pub use linear::LinearMemory;
pub use module::{GuestMemoryExt, GuestModule, HeapStats};
pub use ptr::{GuestPtr, Val};
pub use scope::{GuestBuffer, GuestRegion, GuestScope, SecureGuestBuffer};
pub use shared::SharedGuest;
