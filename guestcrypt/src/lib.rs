//! Post-quantum key encapsulation (Kyber-1024) and password hashing (Argon2id)
//! through sandboxed guest modules
//!
//! The guest modules are loaded lazily, once per process, from the backend chosen in
//! the [config]: either the native builds that ship with this crate or WebAssembly
//! files run by wasmtime. [facade] exposes the operations as `async fn`s.

pub mod backend;
pub mod cli;
mod cmd;
pub mod config;
pub mod facade;

pub use facade::{Argon2Facade, KyberFacade};
