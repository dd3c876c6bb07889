use crate::GuestPtr;

/// Errors raised while talking to a sandboxed guest module
#[derive(Debug, thiserror::Error)]
pub enum GuestError {
    /// The guest allocator returned the null pointer
    #[error("guest allocator failed to provide {len} bytes")]
    AllocationFailure { len: usize },

    /// A guest function reported failure through a nonzero status code
    #[error("guest function {function} failed with status code {code}")]
    NativeCallFailure { function: String, code: i32 },

    /// An argument can not be expressed in the guest ABI
    #[error("argument {index} can not be passed to the guest: {reason}")]
    UnsupportedArgument { index: usize, reason: &'static str },

    /// A KEM context constructor returned the null handle
    #[error("guest could not create a context for algorithm {algorithm}")]
    ContextCreationFailure { algorithm: String },

    /// The guest does not export a function of this name
    #[error("guest does not export {0}")]
    MissingExport(String),

    /// An export was called with arguments that do not match its signature
    #[error("{function} expects {expected} integer arguments of matching width, got {actual:?}")]
    SignatureMismatch {
        function: String,
        expected: usize,
        actual: Vec<crate::Val>,
    },

    /// An export returned something other than what the caller expected
    #[error("{function} returned {actual:?} where a single i32 was expected")]
    UnexpectedResult {
        function: String,
        actual: Option<crate::Val>,
    },

    /// A region lies (partially) outside of the guest's linear memory
    #[error("region of {len} bytes at {ptr} is outside of guest memory ({memory_len} bytes)")]
    OutOfBounds {
        ptr: GuestPtr,
        len: usize,
        memory_len: usize,
    },

    /// A pointer was freed that is not a live allocation
    #[error("attempted to free {0}, which is not a live allocation")]
    InvalidFree(GuestPtr),

    /// The guest trapped or the runtime failed while executing an export
    #[error("guest trapped in {function}")]
    Trap {
        function: String,
        #[source]
        source: anyhow::Error,
    },

    /// The guest module could not be loaded or instantiated
    #[error("failed to instantiate guest module")]
    Instantiation(#[source] anyhow::Error),
}

impl GuestError {
    /// Turn a status code returned by `function` into a result; zero means success
    pub fn check_status(function: &str, code: i32) -> Result<(), Self> {
        match code {
            0 => Ok(()),
            code => Err(Self::NativeCallFailure {
                function: function.to_owned(),
                code,
            }),
        }
    }

    pub fn trap<E: Into<anyhow::Error>>(function: &str, source: E) -> Self {
        Self::Trap {
            function: function.to_owned(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check_status_keeps_code() {
        assert!(GuestError::check_status("f", 0).is_ok());
        match GuestError::check_status("OQS_KEM_keypair", -1) {
            Err(GuestError::NativeCallFailure { function, code }) => {
                assert_eq!(function, "OQS_KEM_keypair");
                assert_eq!(code, -1);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
