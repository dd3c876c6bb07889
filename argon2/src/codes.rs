//! The subset of `Argon2_ErrorCodes` from `argon2.h` this guest can return

pub const ARGON2_OK: i32 = 0;
pub const ARGON2_OUTPUT_PTR_NULL: i32 = -1;
pub const ARGON2_OUTPUT_TOO_SHORT: i32 = -2;
pub const ARGON2_OUTPUT_TOO_LONG: i32 = -3;
pub const ARGON2_PWD_TOO_LONG: i32 = -5;
pub const ARGON2_SALT_TOO_SHORT: i32 = -6;
pub const ARGON2_SALT_TOO_LONG: i32 = -7;
pub const ARGON2_TIME_TOO_SMALL: i32 = -12;
pub const ARGON2_MEMORY_TOO_LITTLE: i32 = -14;
pub const ARGON2_MEMORY_TOO_MUCH: i32 = -15;
pub const ARGON2_LANES_TOO_FEW: i32 = -16;
pub const ARGON2_LANES_TOO_MANY: i32 = -17;
pub const ARGON2_PWD_PTR_MISMATCH: i32 = -18;
pub const ARGON2_SALT_PTR_MISMATCH: i32 = -19;
pub const ARGON2_MEMORY_ALLOCATION_ERROR: i32 = -22;
pub const ARGON2_INCORRECT_PARAMETER: i32 = -25;

/// Translate an error of the [argon2] crate into the code `argon2_hash` would return
pub fn from_error(e: argon2::Error) -> i32 {
    use argon2::Error as E;
    match e {
        E::OutputTooShort => ARGON2_OUTPUT_TOO_SHORT,
        E::OutputTooLong => ARGON2_OUTPUT_TOO_LONG,
        E::PwdTooLong => ARGON2_PWD_TOO_LONG,
        E::SaltTooShort => ARGON2_SALT_TOO_SHORT,
        E::SaltTooLong => ARGON2_SALT_TOO_LONG,
        E::TimeTooSmall => ARGON2_TIME_TOO_SMALL,
        E::MemoryTooLittle => ARGON2_MEMORY_TOO_LITTLE,
        E::MemoryTooMuch => ARGON2_MEMORY_TOO_MUCH,
        // argon2_hash uses the parallelism for both lanes and threads and checks lanes first
        E::ThreadsTooFew => ARGON2_LANES_TOO_FEW,
        E::ThreadsTooMany => ARGON2_LANES_TOO_MANY,
        _ => ARGON2_INCORRECT_PARAMETER,
    }
}
