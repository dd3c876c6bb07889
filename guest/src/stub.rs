//! A scriptable guest for testing code that talks to guest modules
//!
//! [StubGuest] owns a [LinearMemory], records every export call and lets tests
//! decide what each export does, including failing on purpose.

use std::collections::HashMap;
use std::fmt;

use crate::{GuestError, GuestModule, GuestPtr, HeapStats, LinearMemory, Val};

type Handler = Box<dyn FnMut(&mut LinearMemory, &[Val]) -> Result<Option<Val>, GuestError> + Send>;

/// One recorded export call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubCall {
    pub function: String,
    pub args: Vec<Val>,
}

pub struct StubGuest {
    memory: LinearMemory,
    exports: HashMap<String, Handler>,
    calls: Vec<StubCall>,
    malloc_calls: usize,
    frees: Vec<GuestPtr>,
    allocation_budget: Option<usize>,
}

impl StubGuest {
    pub fn new() -> Self {
        Self::with_memory(LinearMemory::default())
    }

    pub fn with_memory(memory: LinearMemory) -> Self {
        Self {
            memory,
            exports: HashMap::new(),
            calls: Vec::new(),
            malloc_calls: 0,
            frees: Vec::new(),
            allocation_budget: None,
        }
    }

    /// Register `handler` as the implementation of the export `name`
    pub fn export<F>(mut self, name: &str, handler: F) -> Self
    where
        F: FnMut(&mut LinearMemory, &[Val]) -> Result<Option<Val>, GuestError> + Send + 'static,
    {
        self.exports.insert(name.to_owned(), Box::new(handler));
        self
    }

    /// Register an export that ignores its arguments and returns `code`
    pub fn export_status(self, name: &str, code: i32) -> Self {
        self.export(name, move |_, _| Ok(Some(Val::I32(code))))
    }

    /// Let `malloc` return the null pointer once `n` allocations succeeded
    pub fn fail_allocations_after(mut self, n: usize) -> Self {
        self.allocation_budget = Some(n);
        self
    }

    /// Export calls in order, not including `malloc` and `free`
    pub fn calls(&self) -> &[StubCall] {
        &self.calls
    }

    /// Calls to the named export
    pub fn calls_to<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a StubCall> + 'a {
        self.calls.iter().filter(move |c| c.function == function)
    }

    pub fn malloc_calls(&self) -> usize {
        self.malloc_calls
    }

    /// Pointers passed to `free`, in order
    pub fn frees(&self) -> &[GuestPtr] {
        &self.frees
    }

    pub fn linear_memory(&self) -> &LinearMemory {
        &self.memory
    }
}

impl Default for StubGuest {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestModule for StubGuest {
    fn malloc(&mut self, len: usize) -> Result<GuestPtr, GuestError> {
        self.malloc_calls += 1;
        if let Some(budget) = self.allocation_budget.as_mut() {
            if *budget == 0 {
                return Ok(GuestPtr::NULL);
            }
            *budget -= 1;
        }
        Ok(self.memory.malloc(len))
    }

    fn free(&mut self, ptr: GuestPtr) -> Result<(), GuestError> {
        self.frees.push(ptr);
        self.memory.free(ptr)
    }

    fn memory(&self) -> &[u8] {
        self.memory.bytes()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.bytes_mut()
    }

    fn call(&mut self, function: &str, args: &[Val]) -> Result<Option<Val>, GuestError> {
        self.calls.push(StubCall {
            function: function.to_owned(),
            args: args.to_vec(),
        });
        let handler = self
            .exports
            .get_mut(function)
            .ok_or_else(|| GuestError::MissingExport(function.to_owned()))?;
        handler(&mut self.memory, args)
    }

    fn heap_stats(&self) -> Option<HeapStats> {
        Some(self.memory.stats())
    }
}

impl fmt::Debug for StubGuest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubGuest")
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .field("calls", &self.calls.len())
            .field("heap", &self.memory.stats())
            .finish()
    }
}
