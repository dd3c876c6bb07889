//! Selecting and loading the guest modules named in a [Config]

use std::path::PathBuf;

use anyhow::Context;
use guestcrypt_argon2::Argon2Guest;
use guestcrypt_guest::{GuestError, GuestModule, GuestPtr, HeapStats, LinearMemory, SharedGuest, Val};
use guestcrypt_oqs::LiboqsGuest;
use guestcrypt_wasm::WasmGuest;

use crate::config::{Backend, Config};

/// A guest module that is either built into this binary (`N`) or loaded from a
/// `.wasm` file
pub enum GuestBackend<N> {
    Native(N),
    Wasm(WasmGuest),
}

impl<N: GuestModule> GuestModule for GuestBackend<N> {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        match self {
            Self::Native(m) => m.malloc(len),
            Self::Wasm(m) => m.malloc(len),
        }
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        match self {
            Self::Native(m) => m.free(ptr),
            Self::Wasm(m) => m.free(ptr),
        }
    }

    fn memory(&self) -> &[u8] {
        match self {
            Self::Native(m) => m.memory(),
            Self::Wasm(m) => m.memory(),
        }
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Native(m) => m.memory_mut(),
            Self::Wasm(m) => m.memory_mut(),
        }
    }

    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        match self {
            Self::Native(m) => m.call(function, args),
            Self::Wasm(m) => m.call(function, args),
        }
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        match self {
            Self::Native(m) => m.heap_stats(),
            Self::Wasm(m) => m.heap_stats(),
        }
    }
}

pub type LiboqsBackend = GuestBackend<LiboqsGuest>;
pub type Argon2Backend = GuestBackend<Argon2Guest>;

async fn load_wasm(path: PathBuf) -> anyhow::Result<WasmGuest> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("could not read WebAssembly module {path:?}"))?;
    log::debug!("compiling {} bytes of WebAssembly from {path:?}", bytes.len());
    WasmGuest::from_bytes(bytes).with_context(|| format!("could not load {path:?}"))
}

fn shared<N, F>(backend: Backend, module: Option<PathBuf>, native: F) -> SharedGuest<GuestBackend<N>>
where
    N: GuestModule + Send + 'static,
    F: Fn() -> N + Send + Sync + 'static,
{
    SharedGuest::new(move || {
        let module = module.clone();
        let native = match backend {
            Backend::Native => Some(native()),
            Backend::Wasm => None,
        };
        async move {
            match (native, module) {
                (Some(native), _) => Ok(GuestBackend::Native(native)),
                (None, Some(path)) => Ok(GuestBackend::Wasm(load_wasm(path).await?)),
                (None, None) => anyhow::bail!("no WebAssembly module configured"),
            }
        }
    })
}

/// The liboqs module as configured; loaded on first use
pub fn liboqs(config: &Config) -> SharedGuest<LiboqsBackend> {
    shared(config.liboqs.backend, config.liboqs.module.clone(), LiboqsGuest::new)
}

/// The argon2 module as configured; loaded on first use
pub fn argon2(config: &Config) -> SharedGuest<Argon2Backend> {
    let max_memory_cost = config.argon2.max_memory_cost;
    shared(config.argon2.backend, config.argon2.module.clone(), move || {
        Argon2Guest::with_memory(LinearMemory::default(), max_memory_cost)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use guestcrypt_guest::GuestMemoryExt;

    #[tokio::test]
    async fn native_backend_by_default() {
        let guest = liboqs(&Config::default());
        assert!(!guest.is_loaded());

        let mut module = guest.lock().await.unwrap();
        assert!(matches!(*module, GuestBackend::Native(_)));
        let ptr = module.malloc(4).unwrap();
        module.write(ptr, b"abcd").unwrap();
        assert_eq!(module.read(ptr, 4).unwrap(), b"abcd");
        module.free(ptr).unwrap();
        assert_eq!(module.heap_stats().unwrap().live_allocations, 0);
    }

    #[tokio::test]
    async fn missing_wasm_module_fails_to_load_every_time() {
        let mut config = Config::default();
        config.argon2.backend = Backend::Wasm;
        config.argon2.module = Some("/nonexistent/argon2.wasm".into());
        let guest = argon2(&config);

        for _ in 0..2 {
            assert!(matches!(guest.lock().await, Err(GuestError::Instantiation(_))));
            assert!(!guest.is_loaded());
        }
    }

    #[tokio::test]
    async fn wasm_backend_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.wat");
        std::fs::write(
            &path,
            r#"(module
                (memory (export "memory") 1)
                (global $top (mut i32) (i32.const 16))
                (func (export "malloc") (param i32) (result i32)
                  (local $p i32)
                  (local.set $p (global.get $top))
                  (global.set $top (i32.add (global.get $top) (local.get 0)))
                  (local.get $p))
                (func (export "free") (param i32)))"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.liboqs.backend = Backend::Wasm;
        config.liboqs.module = Some(path);
        let guest = liboqs(&config);

        let mut module = guest.lock().await.unwrap();
        assert!(matches!(*module, GuestBackend::Wasm(_)));
        assert_eq!(module.malloc(8).unwrap(), GuestPtr::new(16));
        assert!(matches!(
            module.call("OQS_KEM_new", &[Val::I32(0)]),
            Err(GuestError::MissingExport(_))
        ));
    }
}
