//! Argument decoding for guests implemented on the host side

use crate::{GuestError, GuestPtr, Val};

/// The arguments of one export call, checked against its arity
#[derive(Debug, Clone, Copy)]
pub struct ExportArgs<'a> {
    function: &'a str,
    args: &'a [Val],
}

impl<'a> ExportArgs<'a> {
    /// Checks that `args` are exactly `arity` values of type i32
    pub fn new(function: &'a str, args: &'a [Val], arity: usize) -> Result<Self, GuestError> {
        let all_i32 = args.iter().all(|v| matches!(v, Val::I32(_)));
        match args.len() == arity && all_i32 {
            true => Ok(Self { function, args }),
            false => Err(GuestError::SignatureMismatch {
                function: function.to_owned(),
                expected: arity,
                actual: args.to_vec(),
            }),
        }
    }

    pub fn function(&self) -> &'a str {
        self.function
    }

    /// The argument at `index` as an i32
    ///
    /// # Panics
    ///
    /// If `index` is not below the arity given to [ExportArgs::new]. Guests use
    /// fixed indices that match the arity they checked.
    pub fn i32(&self, index: usize) -> i32 {
        match self.args[index] {
            Val::I32(v) => v,
            // excluded by the check in new()
            Val::I64(v) => v as i32,
        }
    }

    pub fn u32(&self, index: usize) -> u32 {
        self.i32(index) as u32
    }

    pub fn ptr(&self, index: usize) -> GuestPtr {
        GuestPtr::from_i32(self.i32(index))
    }

    pub fn size(&self, index: usize) -> usize {
        self.u32(index) as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arity_and_types_are_checked() {
        let args = [Val::I32(16), Val::I32(-1)];
        let decoded = ExportArgs::new("f", &args, 2).unwrap();
        assert_eq!(decoded.ptr(0), GuestPtr::new(16));
        assert_eq!(decoded.u32(1), u32::MAX);

        assert!(matches!(
            ExportArgs::new("f", &args, 3),
            Err(GuestError::SignatureMismatch { expected: 3, .. })
        ));
        assert!(ExportArgs::new("f", &[Val::I64(1)], 1).is_err());
    }

    #[test]
    #[should_panic]
    fn indices_beyond_the_arity_panic() {
        let args = [Val::I32(1)];
        ExportArgs::new("f", &args, 1).unwrap().i32(1);
    }
}
