pub mod kem_kyber1024 {
    use crate::primitives::kem::*;

    /// Algorithm identifier understood by liboqs' `OQS_KEM_new`
    pub const NAME: &str = "Kyber1024";

    // https://pq-crystals.org/kyber/data/kyber-specification-round3-20210804.pdf, table 1
    pub const SK_LEN: usize = 3168;
    pub const PK_LEN: usize = 1568;
    pub const CT_LEN: usize = 1568;
    pub const SHK_LEN: usize = 32;

    pub trait KemKyber1024: Kem<SK_LEN, PK_LEN, CT_LEN, SHK_LEN> {}
}

pub mod password_hash_argon2id {
    use crate::primitives::password_hash::*;

    pub const DEFAULT_TIME_COST: u32 = 4;
    /// KiB
    pub const DEFAULT_MEMORY_COST: u32 = 32 * 1024;
    pub const DEFAULT_PARALLELISM: u32 = 1;
    pub const DEFAULT_HASH_LEN: usize = 32;

    /// Cost parameters of an Argon2id invocation
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Argon2idParams {
        /// Number of passes over memory
        pub time_cost: u32,
        /// Memory in KiB
        pub memory_cost: u32,
        /// Number of lanes
        pub parallelism: u32,
        /// Output length in bytes
        pub hash_length: usize,
    }

    impl Default for Argon2idParams {
        fn default() -> Self {
            Self {
                time_cost: DEFAULT_TIME_COST,
                memory_cost: DEFAULT_MEMORY_COST,
                parallelism: DEFAULT_PARALLELISM,
                hash_length: DEFAULT_HASH_LEN,
            }
        }
    }

    pub trait PasswordHashArgon2id: PasswordHash<Params = Argon2idParams> {}
}

pub use kem_kyber1024::KemKyber1024;
pub use password_hash_argon2id::{Argon2idParams, PasswordHashArgon2id};
