use anyhow::Context;
use guestcrypt_secret_memory::SecretVec;
use rand::rngs::OsRng;
use rand::RngCore;

/// Supplies randomness for seeding guest modules
pub trait EntropySource {
    /// Exactly `n` bytes of cryptographically secure random data
    fn generate_random_data(&self, n: usize) -> anyhow::Result<SecretVec>;
}

impl<E: EntropySource + ?Sized> EntropySource for &E {
    fn generate_random_data(&self, n: usize) -> anyhow::Result<SecretVec> {
        (**self).generate_random_data(n)
    }
}

impl<E: EntropySource + ?Sized> EntropySource for std::sync::Arc<E> {
    fn generate_random_data(&self, n: usize) -> anyhow::Result<SecretVec> {
        (**self).generate_random_data(n)
    }
}

/// The operating system's random number generator
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn generate_random_data(&self, n: usize) -> anyhow::Result<SecretVec> {
        let mut data = SecretVec::zero(n);
        OsRng
            .try_fill_bytes(data.secret_mut())
            .context("Operating system random number generator failed")?;
        Ok(data)
    }
}
