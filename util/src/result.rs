/// Checks a condition is true and returns an error if not.
///
/// # Examples
///
/// ```rust
/// # use guestcrypt_util::result::ensure_or;
/// let len = 1568;
/// assert!(ensure_or(len == 1568, "wrong public key length").is_ok());
/// assert!(ensure_or(len == 3168, "wrong private key length").is_err());
/// ```
pub fn ensure_or<E>(b: bool, err: E) -> Result<(), E> {
    match b {
        true => Ok(()),
        false => Err(err),
    }
}
