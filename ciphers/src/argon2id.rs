//! Argon2id on top of a guest module exporting the reference implementation's
//! `argon2id_hash_raw`
//!
//! Unlike the KEM binding, this talks to the module through plain scoped
//! allocations instead of [guestcrypt_guest::invoke].

use guestcrypt_cipher_traits::{Argon2idParams, PasswordHash, PasswordHashArgon2id};
use guestcrypt_guest::{GuestError, GuestModule, GuestRegion, GuestScope, Val};
use guestcrypt_secret_memory::SecretVec;

use crate::Error;

const HASH_RAW: &str = "argon2id_hash_raw";

fn len_arg(index: usize, len: usize) -> Result<Val, GuestError> {
    Val::from_len(len).ok_or(GuestError::UnsupportedArgument {
        index,
        reason: "length exceeds the 32-bit guest address space",
    })
}

/// Hash `password` under `salt` into `hash_length` bytes
///
/// `memory_cost` is given in KiB. A nonzero `Argon2_ErrorCodes` value from the module
/// is returned as [GuestError::NativeCallFailure] carrying that code.
pub fn argon2id_hash_raw<M>(
    module: &mut M,
    time_cost: u32,
    memory_cost: u32,
    parallelism: u32,
    password: &[u8],
    salt: &[u8],
    hash_length: usize,
) -> Result<SecretVec, Error>
where
    M: GuestModule + ?Sized,
{
    let args_len = [len_arg(4, password.len())?, len_arg(6, salt.len())?, len_arg(8, hash_length)?];

    let mut scope = GuestScope::new(module);
    let hash = scope.alloc_secure(hash_length)?;
    let salt_buf = scope.alloc_copy(salt)?;
    let pwd = scope.alloc_secure_copy(password)?;

    let [pwd_len, salt_len, hash_len] = args_len;
    let status = scope.call_i32(
        HASH_RAW,
        &[
            time_cost.into(),
            memory_cost.into(),
            parallelism.into(),
            pwd.val(),
            pwd_len,
            salt_buf.val(),
            salt_len,
            hash.val(),
            hash_len,
        ],
    )?;
    GuestError::check_status(HASH_RAW, status)?;

    let mut out = SecretVec::zero(hash_length);
    scope.read_into(&hash, out.secret_mut())?;
    scope.release()?;

    log::trace!("argon2id_hash_raw(t={time_cost}, m={memory_cost}, p={parallelism}) produced {hash_length} bytes");
    Ok(out)
}

/// Argon2id as a [PasswordHash], backed by a guest module
///
/// ```rust
/// use guestcrypt_cipher_traits::PasswordHash;
/// use guestcrypt_ciphers::password_hash::{Argon2idGuest, Argon2idParams};
/// use guestcrypt_argon2::Argon2Guest;
///
/// let mut argon2id = Argon2idGuest::new(Argon2Guest::new());
/// let params = Argon2idParams { memory_cost: 64, time_cost: 1, ..Default::default() };
///
/// let mut key = [0u8; 32];
/// argon2id.hash_password(&params, b"hunter2", b"saltsaltsalt", &mut key)?;
/// assert_ne!(key, [0u8; 32]);
/// # Ok::<(), guestcrypt_ciphers::Error>(())
/// ```
pub struct Argon2idGuest<M> {
    module: M,
}

impl<M: GuestModule> Argon2idGuest<M> {
    pub fn new(module: M) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn into_inner(self) -> M {
        self.module
    }
}

impl<M: GuestModule> PasswordHash for Argon2idGuest<M> {
    type Params = Argon2idParams;
    type Error = Error;

    /// `out` must be exactly `params.hash_length` long
    fn hash_password(
        &mut self,
        params: &Argon2idParams,
        password: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<(), Error> {
        Error::check_size(params.hash_length, out.len())?;
        let hash = argon2id_hash_raw(
            &mut self.module,
            params.time_cost,
            params.memory_cost,
            params.parallelism,
            password,
            salt,
            params.hash_length,
        )?;
        out.copy_from_slice(hash.secret());
        Ok(())
    }
}

impl<M: GuestModule> PasswordHashArgon2id for Argon2idGuest<M> {}

#[cfg(test)]
mod test {
    use super::*;
    use guestcrypt_guest::stub::StubGuest;
    use guestcrypt_guest::{GuestMemoryExt, GuestPtr};

    fn arg(args: &[Val], index: usize) -> i32 {
        args[index].as_i32().unwrap()
    }

    /// Writes `hash[i] = pwd[i % pwdlen] ^ salt[i % saltlen]` and returns `code`
    fn xor_stub(code: i32) -> StubGuest {
        StubGuest::new().export(HASH_RAW, move |mem, args| {
            let pwd = mem.read(GuestPtr::from_i32(arg(args, 3)), arg(args, 4) as usize)?.to_vec();
            let salt = mem.read(GuestPtr::from_i32(arg(args, 5)), arg(args, 6) as usize)?.to_vec();
            let out = mem.read_mut(GuestPtr::from_i32(arg(args, 7)), arg(args, 8) as usize)?;
            for (i, b) in out.iter_mut().enumerate() {
                *b = pwd[i % pwd.len()] ^ salt[i % salt.len()];
            }
            Ok(Some(Val::I32(code)))
        })
    }

    #[test]
    fn arguments_reach_the_guest_in_c_order() {
        let mut stub = xor_stub(0);
        let hash = argon2id_hash_raw(&mut stub, 3, 4096, 2, b"pw", b"saltsalt", 4).unwrap();
        assert_eq!(hash.secret(), &[b'p' ^ b's', b'w' ^ b'a', b'p' ^ b'l', b'w' ^ b't']);

        let call = &stub.calls()[0];
        assert_eq!(call.function, HASH_RAW);
        assert_eq!(&call.args[..3], &[Val::I32(3), Val::I32(4096), Val::I32(2)]);
        assert_eq!(call.args[4], Val::I32(2));
        assert_eq!(call.args[6], Val::I32(8));
        assert_eq!(call.args[8], Val::I32(4));
    }

    #[test]
    fn password_and_hash_are_cleared_salt_is_not() {
        let mut stub = xor_stub(0);
        let password = [0x5a; 24];
        let salt = [0x11; 24];
        argon2id_hash_raw(&mut stub, 1, 8, 1, &password, &salt, 24).unwrap();

        let memory = stub.memory();
        let contains = |needle: &[u8]| memory.windows(needle.len()).any(|w| w == needle);
        assert!(!contains(&password));
        assert!(!contains(&[0x5a ^ 0x11; 24]));
        assert!(contains(&salt));
        assert_eq!(stub.heap_stats().unwrap().live_allocations, 0);
    }

    #[test]
    fn nonzero_code_is_a_native_call_failure() {
        let mut stub = xor_stub(-6);
        let err = argon2id_hash_raw(&mut stub, 1, 8, 1, b"pw", b"s", 32).unwrap_err();
        assert!(matches!(
            err,
            Error::Guest(GuestError::NativeCallFailure { ref function, code: -6 }) if function == HASH_RAW
        ));
        assert_eq!(stub.heap_stats().unwrap().live_allocations, 0);
        assert_eq!(stub.frees().len(), 3);
    }

    #[test]
    fn allocation_failure_skips_the_call() {
        let mut stub = xor_stub(0).fail_allocations_after(2);
        let err = argon2id_hash_raw(&mut stub, 1, 8, 1, b"pw", b"salt", 32).unwrap_err();
        assert!(matches!(err, Error::Guest(GuestError::AllocationFailure { len: 2 })));
        assert!(stub.calls().is_empty());
        assert_eq!(stub.heap_stats().unwrap().live_allocations, 0);
    }

    #[test]
    fn output_size_must_match_params() {
        let mut argon2id = Argon2idGuest::new(xor_stub(0));
        let mut out = [0u8; 16];
        let err = argon2id
            .hash_password(&Argon2idParams::default(), b"pw", b"salt", &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BufferSizeMismatch {
                required_size: 32,
                actual_size: 16
            }
        ));
        assert!(argon2id.module().calls().is_empty());
    }
}
