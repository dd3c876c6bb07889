use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use zeroize::{Zeroize, ZeroizeOnDrop};

use guestcrypt_util::file::{fopen_r, fopen_w, LoadValue, Overwrite, Visibility};

use crate::file::StoreSecret;

/// Variable length storage for secret data, e.g. passwords and derived hashes
#[derive(Default)]
pub struct SecretVec {
    storage: Vec<u8>,
}

impl SecretVec {
    /// Returns a new [SecretVec] of `len` zero bytes
    pub fn zero(len: usize) -> Self {
        Self {
            storage: vec![0u8; len],
        }
    }

    pub fn from_slice(slice: &[u8]) -> Self {
        Self {
            storage: slice.to_vec(),
        }
    }

    pub fn secret(&self) -> &[u8] {
        &self.storage
    }

    pub fn secret_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl ZeroizeOnDrop for SecretVec {}
impl Zeroize for SecretVec {
    fn zeroize(&mut self) {
        self.storage.zeroize()
    }
}

impl Drop for SecretVec {
    fn drop(&mut self) {
        self.zeroize()
    }
}

impl Clone for SecretVec {
    fn clone(&self) -> Self {
        Self::from_slice(self.secret())
    }
}

impl fmt::Debug for SecretVec {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "<SECRET; {} bytes>", self.len())
    }
}

impl LoadValue for SecretVec {
    type Error = anyhow::Error;

    /// Read the whole file
    fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let p = path.as_ref();
        let mut file = fopen_r(p).with_context(|| format!("Could not open file {p:?}"))?;
        let mut v = Self::zero(0);
        // Reserve up front so the buffer is not reallocated, which would leave
        // unzeroized copies behind
        let size = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        v.storage.reserve_exact(size.saturating_add(1));
        file.read_to_end(&mut v.storage)
            .with_context(|| format!("Could not load file {p:?}"))?;
        Ok(v)
    }
}

impl StoreSecret for SecretVec {
    type Error = anyhow::Error;

    fn store_secret<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        fopen_w(path, Visibility::Secret, Overwrite::Allow)?.write_all(self.secret())?;
        Ok(())
    }
}
