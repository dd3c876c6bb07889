/// Raw password hashing, i.e. key derivation from a low entropy password
pub trait PasswordHash {
    type Params;
    type Error;

    /// Fill all of `out` with the hash of `password` under `salt`
    fn hash_password(
        &mut self,
        params: &Self::Params,
        password: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<(), Self::Error>;
}
