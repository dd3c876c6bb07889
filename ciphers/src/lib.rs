//! Bindings to cryptographic primitives living in sandboxed guest modules
//!
//! - [kyber]: Kyber-1024 key generation, encapsulation and decapsulation against a
//!   module exporting liboqs' KEM API
//! - [argon2id]: raw Argon2id hashing against a module exporting the reference
//!   implementation's `argon2id_hash_raw`
//!
//! Every operation allocates what it needs inside the module, calls it, copies the
//! results out and releases all allocations again, zeroing the ones that held
//! secrets. This also happens when the operation fails.

use static_assertions::const_assert;

pub mod argon2id;
pub mod entropy;
mod error;
pub mod kyber;

pub use entropy::{EntropySource, SystemEntropy};
pub use error::Error;

/// Kyber-1024 as a [guestcrypt_cipher_traits::Kem]
pub mod kem {
    pub use crate::kyber::Kyber1024Guest;
    pub use guestcrypt_cipher_traits::kem_kyber1024::{CT_LEN, NAME, PK_LEN, SHK_LEN, SK_LEN};
}

/// Argon2id as a [guestcrypt_cipher_traits::PasswordHash]
pub mod password_hash {
    pub use crate::argon2id::Argon2idGuest;
    pub use guestcrypt_cipher_traits::Argon2idParams;
}

// Kyber-1024 shared secrets are used as symmetric keys directly
const_assert!(kem::SHK_LEN == 32);
const_assert!(kem::CT_LEN == kem::PK_LEN);
