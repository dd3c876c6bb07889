pub mod file;
pub mod functional;
pub mod hex;
pub mod result;
