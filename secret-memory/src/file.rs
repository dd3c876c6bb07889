use std::path::Path;

/// Persisting values that may hold secrets
pub trait StoreSecret {
    type Error;

    /// Write to a file only the owner can read
    fn store_secret<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error>;
}
