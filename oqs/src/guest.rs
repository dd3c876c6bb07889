use std::collections::HashMap;
use std::ffi::CString;
use std::ptr::NonNull;

use guestcrypt_guest::abi::ExportArgs;
use guestcrypt_guest::{GuestError, GuestMemoryExt, GuestModule, GuestPtr, HeapStats, LinearMemory, Val};
use oqs_sys::kem::OQS_KEM;
use zeroize::Zeroizing;

use crate::entropy::{EntropyPool, SeededRng};

/// Size of the guest allocation backing a KEM context handle. It holds the
/// algorithm's public key, secret key, ciphertext and shared secret lengths as
/// little endian `u32`s.
pub const CONTEXT_HANDLE_LEN: usize = 16;

const OQS_ERROR: i32 = -1;

/// An `OQS_KEM` object owned by the guest
struct KemContext(NonNull<OQS_KEM>);

// liboqs KEM objects are immutable after construction and not tied to a thread
unsafe impl Send for KemContext {}

impl KemContext {
    fn new(name: &[u8]) -> Option<Self> {
        let name = CString::new(name).ok()?;
        NonNull::new(unsafe { oqs_sys::kem::OQS_KEM_new(name.as_ptr()) }).map(Self)
    }

    fn kem(&self) -> &OQS_KEM {
        unsafe { self.0.as_ref() }
    }

    fn lengths(&self) -> [usize; 4] {
        let kem = self.kem();
        [
            kem.length_public_key,
            kem.length_secret_key,
            kem.length_ciphertext,
            kem.length_shared_secret,
        ]
    }
}

impl Drop for KemContext {
    fn drop(&mut self) {
        unsafe { oqs_sys::kem::OQS_KEM_free(self.0.as_ptr()) }
    }
}

/// In-process guest module exposing liboqs' KEM API
///
/// ```rust
/// use guestcrypt_guest::{invoke, Arg, GuestModule};
/// use guestcrypt_oqs::LiboqsGuest;
///
/// let mut guest = LiboqsGuest::new();
/// let ctx = invoke(&mut guest, "OQS_KEM_new", &mut [Arg::Text("Kyber1024")])?;
/// assert!(matches!(ctx, Some(v) if v.as_i32() != Some(0)));
///
/// // Nothing was injected yet
/// let missing = invoke(&mut guest, "TUTA_inject_entropy", &mut [Arg::Null, Arg::I32(0)])?;
/// assert_eq!(missing.and_then(|v| v.as_i32()), Some(32));
/// # Ok::<(), guestcrypt_guest::GuestError>(())
/// ```
pub struct LiboqsGuest {
    memory: LinearMemory,
    contexts: HashMap<GuestPtr, KemContext>,
    entropy: EntropyPool,
}

impl LiboqsGuest {
    pub fn new() -> Self {
        Self::with_memory(LinearMemory::default())
    }

    pub fn with_memory(memory: LinearMemory) -> Self {
        crate::entropy::install_callback();
        Self {
            memory,
            contexts: HashMap::new(),
            entropy: EntropyPool::default(),
        }
    }

    /// Number of KEM contexts that were created and not freed yet
    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    fn context(&self, function: &str, handle: GuestPtr) -> Result<&KemContext, GuestError> {
        self.contexts
            .get(&handle)
            .ok_or_else(|| GuestError::trap(function, anyhow::anyhow!("no KEM context at {handle}")))
    }

    fn kem_new(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        let args = ExportArgs::new("OQS_KEM_new", args, 1)?;
        let name = self.memory.read_cstr(args.ptr(0))?;
        let Some(ctx) = KemContext::new(name) else {
            log::debug!(
                "liboqs does not provide KEM {:?}",
                String::from_utf8_lossy(name)
            );
            return Ok(Some(GuestPtr::NULL.into()));
        };

        let handle = self.memory.malloc(CONTEXT_HANDLE_LEN);
        if handle.is_null() {
            return Ok(Some(GuestPtr::NULL.into()));
        }
        let header = self.memory.read_mut(handle, CONTEXT_HANDLE_LEN)?;
        for (field, len) in header.chunks_exact_mut(4).zip(ctx.lengths()) {
            field.copy_from_slice(&(len as u32).to_le_bytes());
        }
        self.contexts.insert(handle, ctx);
        Ok(Some(handle.into()))
    }

    fn kem_free(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        let handle = ExportArgs::new("OQS_KEM_free", args, 1)?.ptr(0);
        if handle.is_null() {
            return Ok(None);
        }
        match self.contexts.remove(&handle) {
            Some(ctx) => drop(ctx),
            None => return Err(GuestError::InvalidFree(handle)),
        }
        self.memory.free(handle)?;
        Ok(None)
    }

    fn kem_keypair(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        const F: &str = "OQS_KEM_keypair";
        let args = ExportArgs::new(F, args, 3)?;
        let (pk_ptr, sk_ptr) = (args.ptr(1), args.ptr(2));
        let [pk_len, sk_len, _, _] = self.context(F, args.ptr(0))?.lengths();
        self.memory.read(pk_ptr, pk_len)?;
        self.memory.read(sk_ptr, sk_len)?;

        let Some(_rng) = self.seeded_rng(F) else {
            return Ok(Some(Val::I32(OQS_ERROR)));
        };
        let mut pk = vec![0u8; pk_len];
        let mut sk = Zeroizing::new(vec![0u8; sk_len]);
        let kem = self.context(F, args.ptr(0))?.0.as_ptr();
        let status = unsafe {
            oqs_call!(
                oqs_sys::kem::OQS_KEM_keypair,
                kem,
                pk.as_mut_ptr(),
                sk.as_mut_ptr()
            )
        };

        if status == 0 {
            self.memory.write(pk_ptr, &pk)?;
            self.memory.write(sk_ptr, &sk)?;
        }
        Ok(Some(Val::I32(status)))
    }

    fn kem_encaps(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        const F: &str = "OQS_KEM_encaps";
        let args = ExportArgs::new(F, args, 4)?;
        let (ct_ptr, ss_ptr, pk_ptr) = (args.ptr(1), args.ptr(2), args.ptr(3));
        let [pk_len, _, ct_len, ss_len] = self.context(F, args.ptr(0))?.lengths();
        let pk = self.memory.read(pk_ptr, pk_len)?.to_vec();
        self.memory.read(ct_ptr, ct_len)?;
        self.memory.read(ss_ptr, ss_len)?;

        let Some(_rng) = self.seeded_rng(F) else {
            return Ok(Some(Val::I32(OQS_ERROR)));
        };
        let mut ct = vec![0u8; ct_len];
        let mut ss = Zeroizing::new(vec![0u8; ss_len]);
        let kem = self.context(F, args.ptr(0))?.0.as_ptr();
        let status = unsafe {
            oqs_call!(
                oqs_sys::kem::OQS_KEM_encaps,
                kem,
                ct.as_mut_ptr(),
                ss.as_mut_ptr(),
                pk.as_ptr()
            )
        };

        if status == 0 {
            self.memory.write(ct_ptr, &ct)?;
            self.memory.write(ss_ptr, &ss)?;
        }
        Ok(Some(Val::I32(status)))
    }

    fn kem_decaps(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        const F: &str = "OQS_KEM_decaps";
        let args = ExportArgs::new(F, args, 4)?;
        let (ss_ptr, ct_ptr, sk_ptr) = (args.ptr(1), args.ptr(2), args.ptr(3));
        let [_, sk_len, ct_len, ss_len] = self.context(F, args.ptr(0))?.lengths();
        let ct = self.memory.read(ct_ptr, ct_len)?.to_vec();
        let sk = Zeroizing::new(self.memory.read(sk_ptr, sk_len)?.to_vec());
        self.memory.read(ss_ptr, ss_len)?;

        let mut ss = Zeroizing::new(vec![0u8; ss_len]);
        let kem = self.context(F, args.ptr(0))?.0.as_ptr();
        let status = unsafe {
            oqs_call!(
                oqs_sys::kem::OQS_KEM_decaps,
                kem,
                ss.as_mut_ptr(),
                ct.as_ptr(),
                sk.as_ptr()
            )
        };

        if status == 0 {
            self.memory.write(ss_ptr, &ss)?;
        }
        Ok(Some(Val::I32(status)))
    }

    /// `TUTA_inject_entropy(data, size)`: returns how many bytes are still missing.
    /// `size == 0` is a pure probe and `data` is not touched.
    fn inject_entropy(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        let args = ExportArgs::new("TUTA_inject_entropy", args, 2)?;
        let missing = match args.size(1) {
            0 => self.entropy.missing(),
            len => {
                let data = self.memory.read(args.ptr(0), len)?;
                self.entropy.inject(data)
            }
        };
        Ok(Some(Val::I32(missing as i32)))
    }

    fn seeded_rng(&mut self, function: &str) -> Option<SeededRng> {
        match self.entropy.take() {
            Some(seed) => Some(SeededRng::install(seed)),
            None => {
                log::warn!("refusing {function}: not enough entropy was injected");
                None
            }
        }
    }
}

impl Default for LiboqsGuest {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestModule for LiboqsGuest {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        Ok(self.memory.malloc(len))
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        self.memory.free(ptr)
    }

    fn memory(&self) -> &[u8] {
        self.memory.bytes()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.bytes_mut()
    }

    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        match function {
            "OQS_KEM_new" => self.kem_new(args),
            "OQS_KEM_free" => self.kem_free(args),
            "OQS_KEM_keypair" => self.kem_keypair(args),
            "OQS_KEM_encaps" => self.kem_encaps(args),
            "OQS_KEM_decaps" => self.kem_decaps(args),
            "TUTA_inject_entropy" => self.inject_entropy(args),
            _ => Err(GuestError::MissingExport(function.to_owned())),
        }
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        Some(self.memory.stats())
    }
}
