//! Traits and implementations for Key Encapsulation Mechanisms (KEMs)
//!
//! KEMs are the interface provided by almost all post-quantum
//! secure key exchange mechanisms.
//!
//! Conceptually KEMs are akin to public-key encryption, but instead of encrypting
//! arbitrary data, KEMs are limited to the transmission of keys, randomly chosen during
//! encapsulation.
//!
//! The [Kem] Trait describes the basic API offered by a Key Encapsulation
//! Mechanism. Implementations take `&mut self` because they usually drive a stateful
//! backend, e.g. a sandboxed module with its own allocator and random number generator.
//!
//! Implementing the [Kem]-trait for a KEM is easy. Mostly, you must format the KEM's
//! keys, and ciphertext as `u8` arrays. Below, we provide an example for how the trait can
//! be implemented using a **HORRIBLY INSECURE** DummyKem that only uses static values for keys
//! and ciphertexts as an example.
//!```rust
//! use guestcrypt_cipher_traits::Kem;
//! use guestcrypt_secret_memory::Secret;
//!
//! struct DummyKem {
//!     calls: usize,
//! }
//!
//! impl Kem<1, 1, 1, 1> for DummyKem {
//!     // For this DummyKem, using String for errors is sufficient.
//!     type Error = String;
//!
//!     fn keygen(&mut self, sk: &mut [u8; 1], pk: &mut [u8; 1]) -> Result<(), Self::Error> {
//!         self.calls += 1;
//!         sk[0] = 42;
//!         pk[0] = 21;
//!         Ok(())
//!     }
//!
//!     fn encaps(&mut self, shk: &mut [u8; 1], ct: &mut [u8; 1], pk: &[u8; 1]) -> Result<(), Self::Error> {
//!         self.calls += 1;
//!         if pk[0] != 21 {
//!             return Err("Invalid public key!".to_string());
//!         }
//!         ct[0] = 7;
//!         shk[0] = 17;
//!         Ok(())
//!     }
//!
//!     fn decaps(&mut self, shk: &mut [u8; 1], sk: &[u8; 1], ct: &[u8; 1]) -> Result<(), Self::Error> {
//!         self.calls += 1;
//!         if sk[0] != 42 {
//!             return Err("Invalid secret key!".to_string());
//!         }
//!         if ct[0] != 7 {
//!             return Err("Invalid ciphertext!".to_string());
//!         }
//!         shk[0] = 17;
//!         Ok(())
//!     }
//! }
//!
//! let mut kem = DummyKem { calls: 0 };
//! let mut alice_sk: Secret<{ DummyKem::SK_LEN }> = Secret::zero();
//! let mut alice_pk = [0u8; DummyKem::PK_LEN];
//! kem.keygen(alice_sk.secret_mut(), &mut alice_pk)?;
//!
//! let mut bob_shk: Secret<{ DummyKem::SHK_LEN }> = Secret::zero();
//! let mut bob_ct = [0u8; DummyKem::CT_LEN];
//! kem.encaps(bob_shk.secret_mut(), &mut bob_ct, &alice_pk)?;
//!
//! let mut alice_shk: Secret<{ DummyKem::SHK_LEN }> = Secret::zero();
//! kem.decaps(alice_shk.secret_mut(), alice_sk.secret(), &bob_ct)?;
//!
//! assert_eq!(alice_shk.secret(), bob_shk.secret());
//! assert_eq!(kem.calls, 3);
//! # Ok::<(), String>(())
//!```

/// Key Encapsulation Mechanism
///
/// The KEM interface defines three operations: Key generation, key encapsulation and key
/// decapsulation.
pub trait Kem<const SK_LEN: usize, const PK_LEN: usize, const CT_LEN: usize, const SHK_LEN: usize> {
    type Error;

    /// Secret key length
    const SK_LEN: usize = SK_LEN;
    /// Public key length
    const PK_LEN: usize = PK_LEN;
    /// Ciphertext length
    const CT_LEN: usize = CT_LEN;
    /// Shared secret length
    const SHK_LEN: usize = SHK_LEN;

    /// Generate a keypair consisting of secret key (`sk`) and public key (`pk`)
    ///
    /// `keygen() -> sk, pk`
    fn keygen(&mut self, sk: &mut [u8; SK_LEN], pk: &mut [u8; PK_LEN]) -> Result<(), Self::Error>;

    /// From a public key (`pk`), generate a shared key (`shk`, for local use)
    /// and a cipher text (`ct`, to be sent to the owner of the `pk`).
    ///
    /// `encaps(pk) -> shk, ct`
    fn encaps(
        &mut self,
        shk: &mut [u8; SHK_LEN],
        ct: &mut [u8; CT_LEN],
        pk: &[u8; PK_LEN],
    ) -> Result<(), Self::Error>;

    /// From a secret key (`sk`) and a cipher text (`ct`) derive a shared key
    /// (`shk`)
    ///
    /// `decaps(sk, ct) -> shk`
    fn decaps(
        &mut self,
        shk: &mut [u8; SHK_LEN],
        sk: &[u8; SK_LEN],
        ct: &[u8; CT_LEN],
    ) -> Result<(), Self::Error>;
}
