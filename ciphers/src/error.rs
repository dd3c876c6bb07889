use guestcrypt_guest::GuestError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Guest(#[from] GuestError),

    #[error("entropy source failed to provide {requested} bytes")]
    Entropy {
        requested: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("buffer size mismatch, required {required_size}, actual {actual_size}")]
    BufferSizeMismatch {
        required_size: usize,
        actual_size: usize,
    },
}

impl Error {
    /// Ok if `actual_size == required_size`
    pub fn check_size(required_size: usize, actual_size: usize) -> Result<(), Self> {
        guestcrypt_util::result::ensure_or(
            required_size == actual_size,
            Error::BufferSizeMismatch {
                required_size,
                actual_size,
            },
        )
    }
}
