//! Calling guest exports with host values
//!
//! [invoke] lowers a list of [Arg]s into the integer-only calling convention of the
//! guest: buffers and strings are copied into fresh guest allocations and passed by
//! pointer, scalars are passed through. After the call, mutable buffers are copied
//! back into host memory and every allocation is released (secure ones zeroed first).

use crate::{GuestBuffer, GuestError, GuestModule, GuestRegion, GuestScope, Val};

/// An argument to a guest export
#[derive(Debug)]
pub enum Arg<'a> {
    /// C's `NULL`, passed as `0`
    Null,
    I32(i32),
    I64(i64),
    /// Passed as `0` or `1`
    Bool(bool),
    /// Copied into the guest null terminated; zeroed after the call
    Text(&'a str),
    /// Copied into the guest; freed after the call
    Bytes(&'a [u8]),
    /// Copied into the guest; zeroed and freed after the call
    SecureBytes(&'a [u8]),
    /// Copied into the guest and back out after the call
    Mutable { bytes: &'a mut [u8], secure: bool },
}

impl<'a> Arg<'a> {
    /// In/out buffer holding public data
    pub fn mutable(bytes: &'a mut [u8]) -> Self {
        Arg::Mutable {
            bytes,
            secure: false,
        }
    }

    /// In/out buffer holding secret data; the guest copy is zeroed after the call
    pub fn mutable_secure(bytes: &'a mut [u8]) -> Self {
        Arg::Mutable {
            bytes,
            secure: true,
        }
    }

    /// Check that the argument can be expressed in the guest ABI at all
    fn check(&self) -> Result<(), &'static str> {
        let len = match self {
            Arg::Null | Arg::I32(_) | Arg::I64(_) | Arg::Bool(_) => return Ok(()),
            Arg::Text(text) if text.as_bytes().contains(&0) => {
                return Err("text contains a nul byte and can not be null terminated")
            }
            Arg::Text(text) => text.len() + 1,
            Arg::Bytes(bytes) | Arg::SecureBytes(bytes) => bytes.len(),
            Arg::Mutable { bytes, .. } => bytes.len(),
        };
        match Val::from_len(len) {
            Some(_) => Ok(()),
            None => Err("buffer does not fit into the 32 bit guest address space"),
        }
    }
}

impl From<i32> for Arg<'_> {
    fn from(v: i32) -> Self {
        Arg::I32(v)
    }
}

/// Guests see unsigned 32 bit values as `i32` with the same bit pattern
impl From<u32> for Arg<'_> {
    fn from(v: u32) -> Self {
        Arg::I32(v as i32)
    }
}

impl From<i64> for Arg<'_> {
    fn from(v: i64) -> Self {
        Arg::I64(v)
    }
}

impl From<bool> for Arg<'_> {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(v: &'a str) -> Self {
        Arg::Text(v)
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(v: &'a [u8]) -> Self {
        Arg::Bytes(v)
    }
}

impl<'a, T: Into<Arg<'a>>> From<Option<T>> for Arg<'a> {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Arg::Null)
    }
}

/// Call `function` in `module` with `args`, see the [module level docs](self).
///
/// All arguments are checked before anything is allocated. Allocations happen
/// eagerly, in argument order; if one fails, the ones before it are released and the
/// function is never called. Mutable buffers are written back whenever the function
/// was called, even if it trapped.
pub fn invoke<M: GuestModule + ?Sized>(
    module: &mut M,
    function: &str,
    args: &mut [Arg<'_>],
) -> Result<Option<Val>, GuestError> {
    for (index, arg) in args.iter().enumerate() {
        arg.check()
            .map_err(|reason| GuestError::UnsupportedArgument { index, reason })?;
    }

    let mut scope = GuestScope::new(module);
    let mut lowered = Vec::with_capacity(args.len());
    let mut write_back: Vec<(usize, GuestBuffer)> = Vec::new();

    for (index, arg) in args.iter().enumerate() {
        let val = match arg {
            Arg::Null => Val::I32(0),
            Arg::I32(v) => Val::I32(*v),
            Arg::I64(v) => Val::I64(*v),
            Arg::Bool(v) => Val::from(*v),
            Arg::Text(text) => scope.alloc_cstr(text)?.val(),
            Arg::Bytes(bytes) => scope.alloc_copy(bytes)?.val(),
            Arg::SecureBytes(bytes) => scope.alloc_secure_copy(bytes)?.val(),
            Arg::Mutable { bytes, secure } => {
                let buf = match secure {
                    true => scope.alloc_secure_copy(bytes)?.region(),
                    false => scope.alloc_copy(bytes)?,
                };
                write_back.push((index, buf));
                buf.val()
            }
        };
        lowered.push(val);
    }

    let result = scope.call(function, &lowered);

    for (index, buf) in write_back {
        if let Arg::Mutable { bytes, .. } = &mut args[index] {
            scope.read_into(&buf, bytes)?;
        }
    }

    let result = result?;
    scope.release()?;
    Ok(result)
}

/// [invoke] an export that returns exactly one `i32`, such as a status code
pub fn invoke_i32<M: GuestModule + ?Sized>(
    module: &mut M,
    function: &str,
    args: &mut [Arg<'_>],
) -> Result<i32, GuestError> {
    match invoke(module, function, args)? {
        Some(Val::I32(v)) => Ok(v),
        actual => Err(GuestError::UnexpectedResult {
            function: function.to_owned(),
            actual,
        }),
    }
}
