use argon2::{Algorithm, Argon2, Params, Version};
use guestcrypt_guest::abi::ExportArgs;
use guestcrypt_guest::{GuestError, GuestMemoryExt, GuestModule, GuestPtr, HeapStats, LinearMemory, Val};
use zeroize::Zeroizing;

use crate::codes::*;

/// Largest `m_cost` (KiB) the guest accepts by default, 1 GiB
pub const DEFAULT_MAX_MEMORY_COST: u32 = 1024 * 1024;

/// In-process guest module exposing `argon2id_hash_raw`
///
/// A WebAssembly build allocates the Argon2 memory inside its own linear memory
/// and fails with `ARGON2_MEMORY_ALLOCATION_ERROR` when that is exhausted. This
/// guest emulates the limit with `max_memory_cost`.
pub struct Argon2Guest {
    memory: LinearMemory,
    max_memory_cost: u32,
}

impl Argon2Guest {
    pub fn new() -> Self {
        Self::with_memory(LinearMemory::default(), DEFAULT_MAX_MEMORY_COST)
    }

    pub fn with_memory(memory: LinearMemory, max_memory_cost: u32) -> Self {
        Self {
            memory,
            max_memory_cost,
        }
    }

    pub fn max_memory_cost(&self) -> u32 {
        self.max_memory_cost
    }

    /// Copy an input buffer out of guest memory; `None` for the C pointer/length
    /// mismatch of a null pointer with a nonzero length
    fn input(&self, ptr: GuestPtr, len: usize) -> Result<Option<Zeroizing<Vec<u8>>>, GuestError> {
        match (ptr.is_null(), len) {
            (_, 0) => Ok(Some(Zeroizing::new(Vec::new()))),
            (true, _) => Ok(None),
            (false, len) => Ok(Some(Zeroizing::new(self.memory.read(ptr, len)?.to_vec()))),
        }
    }

    fn argon2id_hash_raw(&mut self, args: &[Val]) -> Result<Option<Val>, GuestError> {
        let args = ExportArgs::new("argon2id_hash_raw", args, 9)?;
        let (t_cost, m_cost, parallelism) = (args.u32(0), args.u32(1), args.u32(2));
        let (hash_ptr, hash_len) = (args.ptr(7), args.size(8));

        if hash_ptr.is_null() {
            return Ok(Some(Val::I32(ARGON2_OUTPUT_PTR_NULL)));
        }
        self.memory.read(hash_ptr, hash_len)?;
        let Some(pwd) = self.input(args.ptr(3), args.size(4))? else {
            return Ok(Some(Val::I32(ARGON2_PWD_PTR_MISMATCH)));
        };
        let Some(salt) = self.input(args.ptr(5), args.size(6))? else {
            return Ok(Some(Val::I32(ARGON2_SALT_PTR_MISMATCH)));
        };

        let mut hash = Zeroizing::new(vec![0u8; hash_len]);
        let code = match self.hash(t_cost, m_cost, parallelism, &pwd, &salt, &mut hash) {
            Ok(()) => {
                self.memory.write(hash_ptr, &hash)?;
                ARGON2_OK
            }
            Err(code) => {
                log::debug!("argon2id_hash_raw(t={t_cost}, m={m_cost}, p={parallelism}) failed with {code}");
                code
            }
        };
        Ok(Some(Val::I32(code)))
    }

    fn hash(
        &self,
        t_cost: u32,
        m_cost: u32,
        parallelism: u32,
        pwd: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<(), i32> {
        let params = Params::new(m_cost, t_cost, parallelism, Some(out.len())).map_err(from_error)?;
        if m_cost > self.max_memory_cost {
            return Err(ARGON2_MEMORY_ALLOCATION_ERROR);
        }
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(pwd, salt, out)
            .map_err(from_error)
    }
}

impl Default for Argon2Guest {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestModule for Argon2Guest {
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
            "argon2id_hash_raw" => self.argon2id_hash_raw(args),
            _ => Err(GuestError::MissingExport(function.to_owned())),
        }
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        Some(self.memory.stats())
    }
}
