//! Kyber-1024 on top of a guest module exporting liboqs' KEM API
//!
//! Each operation creates its own `OQS_KEM` context and destroys it again before
//! returning, so operations are self contained and can be retried freely.
//! Key generation and encapsulation first top up the module's entropy pool
//! (`TUTA_inject_entropy`) from an [EntropySource]; without that, the module would
//! produce predictable keys or refuse to work.

use guestcrypt_cipher_traits::kem_kyber1024::{CT_LEN, NAME, PK_LEN, SHK_LEN, SK_LEN};
use guestcrypt_cipher_traits::{Kem, KemKyber1024};
use guestcrypt_guest::{
    invoke_i32, Arg, GuestError, GuestModule, GuestPtr, GuestRegion, GuestScope,
};
use guestcrypt_secret_memory::{Public, Secret};

use crate::{EntropySource, Error, SystemEntropy};

/// A Kyber-1024 public key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KyberPublicKey {
    pub encoded: Public<PK_LEN>,
}

impl KyberPublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Error::check_size(PK_LEN, bytes.len())?;
        Ok(Self {
            encoded: Public::from_slice(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded.value
    }
}

/// A Kyber-1024 private key
#[derive(Clone, Debug)]
pub struct KyberPrivateKey {
    pub encoded: Secret<SK_LEN>,
}

impl KyberPrivateKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Error::check_size(SK_LEN, bytes.len())?;
        Ok(Self {
            encoded: Secret::from_slice(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.encoded.secret()
    }
}

#[derive(Clone, Debug)]
pub struct KyberKeyPair {
    pub public_key: KyberPublicKey,
    pub private_key: KyberPrivateKey,
}

/// Result of encapsulating to a public key: the ciphertext goes to the key's owner,
/// the shared secret stays here
#[derive(Clone, Debug)]
pub struct KyberEncapsulation {
    pub ciphertext: Public<CT_LEN>,
    pub shared_secret: Secret<SHK_LEN>,
}

/// Generate a fresh key pair inside `module`
pub fn generate_key_pair<M, E>(module: &mut M, entropy: &E) -> Result<KyberKeyPair, Error>
where
    M: GuestModule + ?Sized,
    E: EntropySource + ?Sized,
{
    const F: &str = "OQS_KEM_keypair";
    let mut scope = GuestScope::new(module);
    let ctx = new_context(&mut scope)?;
    seed_entropy(&mut scope, entropy)?;

    let pk = scope.alloc(PK_LEN)?;
    let sk = scope.alloc_secure(SK_LEN)?;
    let status = scope.call_i32(F, &[ctx.into(), pk.val(), sk.val()])?;
    GuestError::check_status(F, status)?;

    let mut public_key = Public::zero();
    let mut private_key = Secret::zero();
    scope.read_into(&pk, &mut public_key.value)?;
    scope.read_into(&sk, private_key.secret_mut())?;
    scope.release()?;

    log::debug!("generated Kyber-1024 key pair {public_key:?}");
    Ok(KyberKeyPair {
        public_key: KyberPublicKey {
            encoded: public_key,
        },
        private_key: KyberPrivateKey {
            encoded: private_key,
        },
    })
}

/// Encapsulate a fresh shared secret to `public_key`
pub fn encapsulate<M, E>(
    module: &mut M,
    entropy: &E,
    public_key: &KyberPublicKey,
) -> Result<KyberEncapsulation, Error>
where
    M: GuestModule + ?Sized,
    E: EntropySource + ?Sized,
{
    const F: &str = "OQS_KEM_encaps";
    let mut scope = GuestScope::new(module);
    let ctx = new_context(&mut scope)?;
    seed_entropy(&mut scope, entropy)?;

    let ct = scope.alloc_secure(CT_LEN)?;
    let ss = scope.alloc_secure(SHK_LEN)?;
    let pk = scope.alloc_secure_copy(public_key.as_bytes())?;
    let status = scope.call_i32(F, &[ctx.into(), ct.val(), ss.val(), pk.val()])?;
    GuestError::check_status(F, status)?;

    let mut ciphertext = Public::zero();
    let mut shared_secret = Secret::zero();
    scope.read_into(&ct, &mut ciphertext.value)?;
    scope.read_into(&ss, shared_secret.secret_mut())?;
    scope.release()?;

    Ok(KyberEncapsulation {
        ciphertext,
        shared_secret,
    })
}

/// Recover the shared secret `ciphertext` carries for the owner of `private_key`
///
/// Kyber decapsulation is implicitly rejecting: a tampered ciphertext yields an
/// unrelated shared secret, not an error.
pub fn decapsulate<M>(
    module: &mut M,
    private_key: &KyberPrivateKey,
    ciphertext: &[u8],
) -> Result<Secret<SHK_LEN>, Error>
where
    M: GuestModule + ?Sized,
{
    const F: &str = "OQS_KEM_decaps";
    Error::check_size(CT_LEN, ciphertext.len())?;

    let mut scope = GuestScope::new(module);
    let ctx = new_context(&mut scope)?;

    let ct = scope.alloc_secure_copy(ciphertext)?;
    let sk = scope.alloc_secure_copy(private_key.as_bytes())?;
    let ss = scope.alloc_secure(SHK_LEN)?;
    let status = scope.call_i32(F, &[ctx.into(), ss.val(), ct.val(), sk.val()])?;
    GuestError::check_status(F, status)?;

    let mut shared_secret = Secret::zero();
    scope.read_into(&ss, shared_secret.secret_mut())?;
    scope.release()?;
    Ok(shared_secret)
}

/// Create a Kyber-1024 context that the scope destroys when it ends
fn new_context<M>(scope: &mut GuestScope<'_, M>) -> Result<GuestPtr, Error>
where
    M: GuestModule + ?Sized,
{
    let handle = invoke_i32(scope.module(), "OQS_KEM_new", &mut [Arg::Text(NAME)])?;
    let handle = GuestPtr::from_i32(handle);
    if handle.is_null() {
        return Err(GuestError::ContextCreationFailure {
            algorithm: NAME.to_owned(),
        }
        .into());
    }
    scope.defer_destroy("OQS_KEM_free", handle);
    Ok(handle)
}

/// Give the module as much fresh entropy as it asks for
fn seed_entropy<M, E>(scope: &mut GuestScope<'_, M>, entropy: &E) -> Result<(), Error>
where
    M: GuestModule + ?Sized,
    E: EntropySource + ?Sized,
{
    const F: &str = "TUTA_inject_entropy";
    let probe = invoke_i32(scope.module(), F, &mut [Arg::Null, Arg::I32(0)])?;
    let requested = usize::try_from(probe)
        .map_err(|_| GuestError::NativeCallFailure {
            function: F.to_owned(),
            code: probe,
        })?;
    if requested == 0 {
        return Ok(());
    }

    let data = entropy
        .generate_random_data(requested)
        .map_err(|source| Error::Entropy { requested, source })?;
    Error::check_size(requested, data.len())?;

    let len = requested as u32;
    let missing = invoke_i32(
        scope.module(),
        F,
        &mut [Arg::SecureBytes(data.secret()), len.into()],
    )?;
    log::trace!("injected {requested} bytes of entropy, {missing} still missing");
    GuestError::check_status(F, missing)?;
    Ok(())
}

/// Kyber-1024 as a [Kem], backed by a guest module and an entropy source
///
/// ```rust
/// use guestcrypt_cipher_traits::Kem;
/// use guestcrypt_ciphers::kem::{Kyber1024Guest, PK_LEN, SHK_LEN, SK_LEN, CT_LEN};
/// use guestcrypt_ciphers::SystemEntropy;
/// use guestcrypt_oqs::LiboqsGuest;
/// use guestcrypt_secret_memory::Secret;
///
/// let mut kem = Kyber1024Guest::new(LiboqsGuest::new(), SystemEntropy);
///
/// let mut sk = Secret::<SK_LEN>::zero();
/// let mut pk = [0u8; PK_LEN];
/// kem.keygen(sk.secret_mut(), &mut pk)?;
///
/// let mut shk_enc = Secret::<SHK_LEN>::zero();
/// let mut ct = [0u8; CT_LEN];
/// kem.encaps(shk_enc.secret_mut(), &mut ct, &pk)?;
///
/// let mut shk_dec = Secret::<SHK_LEN>::zero();
/// kem.decaps(shk_dec.secret_mut(), sk.secret(), &ct)?;
/// assert_eq!(shk_enc.secret(), shk_dec.secret());
/// # Ok::<(), guestcrypt_ciphers::Error>(())
/// ```
pub struct Kyber1024Guest<M, E = SystemEntropy> {
    module: M,
    entropy: E,
}

impl<M: GuestModule, E: EntropySource> Kyber1024Guest<M, E> {
    pub fn new(module: M, entropy: E) -> Self {
        Self { module, entropy }
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn into_inner(self) -> (M, E) {
        (self.module, self.entropy)
    }
}

impl<M: GuestModule, E: EntropySource> Kem<SK_LEN, PK_LEN, CT_LEN, SHK_LEN> for Kyber1024Guest<M, E> {
    type Error = Error;

    fn keygen(&mut self, sk: &mut [u8; SK_LEN], pk: &mut [u8; PK_LEN]) -> Result<(), Error> {
        let pair = generate_key_pair(&mut self.module, &self.entropy)?;
        sk.copy_from_slice(pair.private_key.as_bytes());
        pk.copy_from_slice(pair.public_key.as_bytes());
        Ok(())
    }

    fn encaps(
        &mut self,
        shk: &mut [u8; SHK_LEN],
        ct: &mut [u8; CT_LEN],
        pk: &[u8; PK_LEN],
    ) -> Result<(), Error> {
        let pk = KyberPublicKey {
            encoded: Public::new(*pk),
        };
        let enc = encapsulate(&mut self.module, &self.entropy, &pk)?;
        shk.copy_from_slice(enc.shared_secret.secret());
        ct.copy_from_slice(&enc.ciphertext.value);
        Ok(())
    }

    fn decaps(
        &mut self,
        shk: &mut [u8; SHK_LEN],
        sk: &[u8; SK_LEN],
        ct: &[u8; CT_LEN],
    ) -> Result<(), Error> {
        let sk = KyberPrivateKey {
            encoded: Secret::from_slice(sk),
        };
        let ss = decapsulate(&mut self.module, &sk, ct)?;
        shk.copy_from_slice(ss.secret());
        Ok(())
    }
}

impl<M: GuestModule, E: EntropySource> KemKyber1024 for Kyber1024Guest<M, E> {}
