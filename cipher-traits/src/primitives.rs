//! Traits for cryptographic primitives used in guestcrypt, specifically KEM and password
//! hashing.

pub(crate) mod kem;
pub(crate) mod password_hash;

pub use kem::Kem;
pub use password_hash::PasswordHash;
