//! Randomness for liboqs, drawn only from entropy the host injected

use std::cell::RefCell;
use std::sync::Once;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use zeroize::Zeroizing;

/// Bytes of injected entropy needed before a randomized operation
pub const ENTROPY_POOL_LEN: usize = 32;

/// Collects injected entropy until a randomized operation consumes it
#[derive(Default)]
pub(crate) struct EntropyPool {
    seed: Zeroizing<[u8; ENTROPY_POOL_LEN]>,
    filled: usize,
}

impl EntropyPool {
    /// Bytes still missing
    pub fn missing(&self) -> usize {
        ENTROPY_POOL_LEN - self.filled
    }

    /// Absorb as much of `data` as is missing; returns what is still missing
    pub fn inject(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.missing());
        self.seed[self.filled..self.filled + n].copy_from_slice(&data[..n]);
        self.filled += n;
        self.missing()
    }

    /// Empty the pool, returning its contents if it was full
    pub fn take(&mut self) -> Option<Zeroizing<[u8; ENTROPY_POOL_LEN]>> {
        let seed = match self.missing() {
            0 => Some(Zeroizing::new(*self.seed)),
            _ => None,
        };
        *self.seed = [0u8; ENTROPY_POOL_LEN];
        self.filled = 0;
        seed
    }
}

thread_local! {
    /// The generator liboqs draws from during the current call on this thread
    static ACTIVE_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Makes liboqs draw randomness from a generator seeded with injected entropy,
/// for as long as the guard lives
pub(crate) struct SeededRng(());

impl SeededRng {
    pub fn install(seed: Zeroizing<[u8; ENTROPY_POOL_LEN]>) -> Self {
        install_callback();
        ACTIVE_RNG.with(|rng| *rng.borrow_mut() = Some(StdRng::from_seed(*seed)));
        Self(())
    }
}

impl Drop for SeededRng {
    fn drop(&mut self) {
        ACTIVE_RNG.with(|rng| rng.borrow_mut().take());
    }
}

/// Route liboqs' `OQS_randombytes` through [ACTIVE_RNG]
pub(crate) fn install_callback() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| unsafe {
        oqs_sys::common::OQS_init();
        oqs_sys::rand::OQS_randombytes_custom_algorithm(Some(injected_randombytes));
    });
}

unsafe extern "C" fn injected_randombytes(random_array: *mut u8, bytes_to_read: usize) {
    if bytes_to_read == 0 {
        return;
    }
    let out = std::slice::from_raw_parts_mut(random_array, bytes_to_read);
    let served = ACTIVE_RNG
        .try_with(|rng| match rng.borrow_mut().as_mut() {
            Some(rng) => {
                rng.fill_bytes(out);
                true
            }
            None => false,
        })
        .unwrap_or(false);

    // There is no way to report failure to liboqs and handing out predictable bytes
    // is not an option
    if !served {
        log::error!("liboqs requested randomness outside of a seeded operation, aborting");
        std::process::abort();
    }
}
