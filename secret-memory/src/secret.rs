use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use zeroize::{Zeroize, ZeroizeOnDrop};

use guestcrypt_util::file::{fopen_r, fopen_w, LoadValue, Overwrite, ReadExactToEnd, Visibility};
use guestcrypt_util::functional::mutating;

use crate::file::StoreSecret;

/// Fixed size storage for secret data such as private keys and shared secrets
///
/// The bytes live on the heap, so moving a [Secret] around does not leave copies
/// behind on the stack. They are zeroized when the value is dropped.
pub struct Secret<const N: usize> {
    storage: Box<[u8; N]>,
}

impl<const N: usize> Secret<N> {
    /// Copy `slice` into a new [Secret]
    ///
    /// # Panics
    ///
    /// If `slice` is not exactly `N` bytes long.
    pub fn from_slice(slice: &[u8]) -> Self {
        mutating(Self::zero(), |s| s.secret_mut().copy_from_slice(slice))
    }

    /// Returns a new [Secret] that is zero initialized
    pub fn zero() -> Self {
        Self {
            storage: Box::new([0u8; N]),
        }
    }

    /// Borrows the data
    pub fn secret(&self) -> &[u8; N] {
        &self.storage
    }

    /// Borrows the data mutably
    pub fn secret_mut(&mut self) -> &mut [u8; N] {
        &mut self.storage
    }
}

impl<const N: usize> ZeroizeOnDrop for Secret<N> {}
impl<const N: usize> Zeroize for Secret<N> {
    fn zeroize(&mut self) {
        self.storage[..].zeroize()
    }
}

impl<const N: usize> Drop for Secret<N> {
    fn drop(&mut self) {
        self.zeroize()
    }
}

impl<const N: usize> Clone for Secret<N> {
    fn clone(&self) -> Self {
        Self::from_slice(self.secret())
    }
}

/// The Debug implementation of [Secret] does not reveal the secret data,
/// instead a placeholder `<SECRET>` is used
impl<const N: usize> fmt::Debug for Secret<N> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("<SECRET>")
    }
}

impl<const N: usize> LoadValue for Secret<N> {
    type Error = anyhow::Error;

    fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut v = Self::zero();
        let p = path.as_ref();
        fopen_r(p)
            .with_context(|| format!("Could not open file {p:?}"))?
            .read_exact_to_end(v.secret_mut())
            .with_context(|| format!("Could not load file {p:?}"))?;
        Ok(v)
    }
}

impl<const N: usize> StoreSecret for Secret<N> {
    type Error = anyhow::Error;

    fn store_secret<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        fopen_w(path, Visibility::Secret, Overwrite::Allow)?.write_all(self.secret())?;
        Ok(())
    }
}
