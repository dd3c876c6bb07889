//! Argon2id behind the flat C ABI of the reference implementation's WebAssembly build
//!
//! [Argon2Guest] exports `malloc`, `free` and
//! `argon2id_hash_raw(t_cost, m_cost, parallelism, pwd, pwdlen, salt, saltlen, hash, hashlen)`,
//! computed by the [argon2] crate. Failures are reported as the reference
//! implementation's `Argon2_ErrorCodes`, see [codes].

pub mod codes;
mod guest;

pub use guest::{Argon2Guest, DEFAULT_MAX_MEMORY_COST};
