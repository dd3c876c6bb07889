//! liboqs, served through the same flat C ABI as a WebAssembly build of it
//!
//! [LiboqsGuest] exports `malloc`, `free`, `OQS_KEM_new`, `OQS_KEM_free`,
//! `OQS_KEM_keypair`, `OQS_KEM_encaps`, `OQS_KEM_decaps` and `TUTA_inject_entropy`
//! over a [LinearMemory](guestcrypt_guest::LinearMemory). Everything that goes in or
//! out passes through guest memory, so code written against it works unchanged
//! against a sandboxed `liboqs.wasm`.
//!
//! Like the WebAssembly build, the module has no access to operating system
//! randomness: keypair generation and encapsulation only work after the host
//! injected enough entropy, and every such operation consumes it.

/// Call into a libOQS function, returning its status as the guest ABI's `i32`
macro_rules! oqs_call {
    ($name:path, $($args:expr),*) => {{
        use oqs_sys::common::OQS_STATUS::*;

        let status = $name($($args),*);
        match status {
            OQS_SUCCESS => {}, // nop
            OQS_EXTERNAL_LIB_ERROR_OPENSSL => {
                log::warn!("OpenSSL error in liboqs' {}.", stringify!($name));
            },
            OQS_ERROR => {
                log::warn!("Unknown error in liboqs' {}.", stringify!($name));
            }
        }
        status as i32
    }};
    ($name:ident) => { oqs_call!($name, ) };
}

mod entropy;
mod guest;

pub use entropy::ENTROPY_POOL_LEN;
pub use guest::{LiboqsGuest, CONTEXT_HANDLE_LEN};
