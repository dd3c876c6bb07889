pub mod debug;
pub mod file;

mod public;
pub use crate::public::Public;

mod secret;
pub use crate::secret::Secret;

mod secret_vec;
pub use crate::secret_vec::SecretVec;
