//! [GuestModule] over a WebAssembly instance
//!
//! The module must not import anything and has to export its linear memory as
//! `memory` plus `malloc(i32) -> i32` and `free(i32)`. This is what an
//! Emscripten or wasi-sdk build of a C library with `-nostdlib`-style glue and
//! those functions exported looks like.

use std::path::Path;

use anyhow::Context;
use guestcrypt_guest::{GuestError, GuestModule, GuestPtr, Val};
use wasmtime::{Engine, Instance, Memory, Module, Store, TypedFunc, ValType};

pub struct WasmGuest {
    store: Store<()>,
    instance: Instance,
    memory: Memory,
    malloc: TypedFunc<i32, i32>,
    free: TypedFunc<i32, ()>,
}

impl WasmGuest {
    /// Compile and instantiate the `.wasm` (or `.wat`) file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("loading WebAssembly module {path:?}");
        let engine = Engine::default();
        let module = Module::from_file(&engine, path)
            .with_context(|| format!("Could not compile WebAssembly module {path:?}"))?;
        Self::instantiate(&engine, &module)
    }

    /// Compile and instantiate a module given as binary or text
    pub fn from_bytes<B: AsRef<[u8]>>(bytes: B) -> anyhow::Result<Self> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).context("Could not compile WebAssembly module")?;
        Self::instantiate(&engine, &module)
    }

    fn instantiate(engine: &Engine, module: &Module) -> anyhow::Result<Self> {
        let mut store = Store::new(engine, ());
        let instance = Instance::new(&mut store, module, &[])
            .context("Could not instantiate WebAssembly module; it must not have imports")?;
        let memory = instance
            .get_memory(&mut store, "memory")
            .context("WebAssembly module does not export its memory")?;
        let malloc = instance
            .get_typed_func::<i32, i32>(&mut store, "malloc")
            .context("WebAssembly module does not export malloc(i32) -> i32")?;
        let free = instance
            .get_typed_func::<i32, ()>(&mut store, "free")
            .context("WebAssembly module does not export free(i32)")?;

        Ok(Self {
            store,
            instance,
            memory,
            malloc,
            free,
        })
    }
}

fn to_wasm(v: &Val) -> wasmtime::Val {
    match *v {
        Val::I32(v) => wasmtime::Val::I32(v),
        Val::I64(v) => wasmtime::Val::I64(v),
    }
}

fn from_wasm(v: &wasmtime::Val) -> Option<Val> {
    match *v {
        wasmtime::Val::I32(v) => Some(Val::I32(v)),
        wasmtime::Val::I64(v) => Some(Val::I64(v)),
        _ => None,
    }
}

impl GuestModule for WasmGuest {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        // Larger than the address space; a real malloc would fail too
        let Ok(len) = u32::try_from(len) else {
            return Ok(GuestPtr::NULL);
        };
        self.malloc
            .call(&mut self.store, len as i32)
            .map(GuestPtr::from_i32)
            .map_err(|e| GuestError::trap("malloc", e))
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        self.free
            .call(&mut self.store, ptr.offset() as i32)
            .map_err(|e| GuestError::trap("free", e))
    }

    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        let func = self
            .instance
            .get_func(&mut self.store, function)
            .ok_or_else(|| GuestError::MissingExport(function.to_owned()))?;

        let ty = func.ty(&self.store);
        let matching = ty.params().len() == args.len()
            && ty.params().zip(args).all(|(param, arg)| {
                matches!(
                    (param, arg),
                    (ValType::I32, Val::I32(_)) | (ValType::I64, Val::I64(_))
                )
            });
        if !matching {
            return Err(GuestError::SignatureMismatch {
                function: function.to_owned(),
                expected: ty.params().len(),
                actual: args.to_vec(),
            });
        }

        let params: Vec<wasmtime::Val> = args.iter().map(to_wasm).collect();
        let mut results = vec![wasmtime::Val::I32(0); ty.results().len()];
        func.call(&mut self.store, &params, &mut results)
            .map_err(|e| GuestError::trap(function, e))?;

        match results.as_slice() {
            [] => Ok(None),
            [wasmtime::Val::I32(v)] => Ok(Some(Val::I32(*v))),
            [wasmtime::Val::I64(v)] => Ok(Some(Val::I64(*v))),
            // report the first result; the caller only ever expects one
            results => Err(GuestError::UnexpectedResult {
                function: function.to_owned(),
                actual: results.first().and_then(from_wasm),
            }),
        }
    }
}
