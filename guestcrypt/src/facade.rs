//! Asynchronous entry points over lazily loaded, shared guest modules
//!
//! The first call loads the module; concurrent first calls wait for the same load.
//! Each operation then holds the module exclusively for its whole
//! allocate/call/free cycle.

use guestcrypt_cipher_traits::Argon2idParams;
use guestcrypt_ciphers::kyber::{
    self, KyberEncapsulation, KyberKeyPair, KyberPrivateKey, KyberPublicKey,
};
use guestcrypt_ciphers::kem::SHK_LEN;
use guestcrypt_ciphers::{argon2id, EntropySource, Error, SystemEntropy};
use guestcrypt_guest::{GuestModule, SharedGuest};
use guestcrypt_secret_memory::{Secret, SecretVec};

/// Kyber-1024 key generation, encapsulation and decapsulation
pub struct KyberFacade<M, E = SystemEntropy> {
    guest: SharedGuest<M>,
    entropy: E,
}

impl<M: GuestModule + Send + 'static> KyberFacade<M> {
    /// Seed the module from the operating system's random number generator
    pub fn new(guest: SharedGuest<M>) -> Self {
        Self::with_entropy(guest, SystemEntropy)
    }
}

impl<M, E> KyberFacade<M, E>
where
    M: GuestModule + Send + 'static,
    E: EntropySource,
{
    pub fn with_entropy(guest: SharedGuest<M>, entropy: E) -> Self {
        Self { guest, entropy }
    }

    pub fn guest(&self) -> &SharedGuest<M> {
        &self.guest
    }

    pub async fn generate_key_pair(&self) -> Result<KyberKeyPair, Error> {
        let mut module = self.guest.lock().await?;
        kyber::generate_key_pair(&mut *module, &self.entropy)
    }

    pub async fn encapsulate(&self, public_key: &KyberPublicKey) -> Result<KyberEncapsulation, Error> {
        let mut module = self.guest.lock().await?;
        kyber::encapsulate(&mut *module, &self.entropy, public_key)
    }

    pub async fn decapsulate(
        &self,
        private_key: &KyberPrivateKey,
        ciphertext: &[u8],
    ) -> Result<Secret<SHK_LEN>, Error> {
        let mut module = self.guest.lock().await?;
        kyber::decapsulate(&mut *module, private_key, ciphertext)
    }
}

/// Raw Argon2id hashing
pub struct Argon2Facade<M> {
    guest: SharedGuest<M>,
}

impl<M: GuestModule + Send + 'static> Argon2Facade<M> {
    pub fn new(guest: SharedGuest<M>) -> Self {
        Self { guest }
    }

    pub fn guest(&self) -> &SharedGuest<M> {
        &self.guest
    }

    pub async fn argon2id_hash_raw(
        &self,
        time_cost: u32,
        memory_cost: u32,
        parallelism: u32,
        password: &[u8],
        salt: &[u8],
        hash_length: usize,
    ) -> Result<SecretVec, Error> {
        let mut module = self.guest.lock().await?;
        argon2id::argon2id_hash_raw(
            &mut *module,
            time_cost,
            memory_cost,
            parallelism,
            password,
            salt,
            hash_length,
        )
    }

    pub async fn hash_password(
        &self,
        params: &Argon2idParams,
        password: &[u8],
        salt: &[u8],
    ) -> Result<SecretVec, Error> {
        self.argon2id_hash_raw(
            params.time_cost,
            params.memory_cost,
            params.parallelism,
            password,
            salt,
            params.hash_length,
        )
        .await
    }
}
