use guestcrypt_argon2::codes::{ARGON2_MEMORY_ALLOCATION_ERROR, ARGON2_SALT_TOO_SHORT};
use guestcrypt_argon2::Argon2Guest;
use guestcrypt_cipher_traits::PasswordHash;
use guestcrypt_ciphers::argon2id::argon2id_hash_raw;
use guestcrypt_ciphers::password_hash::{Argon2idGuest, Argon2idParams};
use guestcrypt_ciphers::Error;
use guestcrypt_guest::{GuestError, GuestModule, LinearMemory};
use hex_literal::hex;

fn hash(guest: &mut Argon2Guest, t: u32, m: u32, p: u32, pwd: &[u8], salt: &[u8], len: usize) -> Vec<u8> {
    argon2id_hash_raw(guest, t, m, p, pwd, salt, len)
        .unwrap()
        .secret()
        .to_vec()
}

#[test]
fn reference_vector() {
    let mut guest = Argon2Guest::new();
    let out = hash(&mut guest, 2, 1 << 16, 1, b"password", b"somesalt", 32);
    assert_eq!(
        out,
        hex!("09316115d5cf24ed5a15a31a3ba326e5cf32edc24702987c02b6566f61913cf7")
    );
}

#[test]
fn deterministic_and_sensitive_to_every_parameter() {
    let mut guest = Argon2Guest::new();
    let base = hash(&mut guest, 1, 64, 1, b"password", b"somesalt", 32);
    assert_eq!(base, hash(&mut guest, 1, 64, 1, b"password", b"somesalt", 32));

    let variants = [
        hash(&mut guest, 2, 64, 1, b"password", b"somesalt", 32),
        hash(&mut guest, 1, 128, 1, b"password", b"somesalt", 32),
        hash(&mut guest, 1, 64, 2, b"password", b"somesalt", 32),
        hash(&mut guest, 1, 64, 1, b"passwore", b"somesalt", 32),
        hash(&mut guest, 1, 64, 1, b"password", b"somesalu", 32),
    ];
    for v in variants {
        assert_ne!(v, base);
    }
    assert_eq!(hash(&mut guest, 1, 64, 1, b"password", b"somesalt", 64).len(), 64);
    assert_eq!(guest.heap_stats().unwrap().live_allocations, 0);
}

#[test]
fn password_copy_is_zeroed() {
    let mut guest = Argon2Guest::new();
    let password = b"correct horse battery staple";
    let out = hash(&mut guest, 1, 64, 1, password, b"somesalt", 32);

    let memory = guest.memory();
    let contains = |needle: &[u8]| memory.windows(needle.len()).any(|w| w == needle);
    assert!(!contains(password));
    assert!(!contains(&out));
    assert!(contains(b"somesalt"));
}

#[test]
fn native_error_codes_are_preserved() {
    let mut guest = Argon2Guest::new();
    let err = argon2id_hash_raw(&mut guest, 1, 64, 1, b"password", b"salt", 32).unwrap_err();
    assert!(matches!(
        err,
        Error::Guest(GuestError::NativeCallFailure { code, .. }) if code == ARGON2_SALT_TOO_SHORT
    ));
    assert_eq!(guest.heap_stats().unwrap().live_allocations, 0);
}

#[test]
fn exceeding_the_guest_memory_budget_fails_cleanly() {
    let mut guest = Argon2Guest::with_memory(LinearMemory::default(), 1024);
    let err = argon2id_hash_raw(&mut guest, 1, 2048, 1, b"password", b"somesalt", 32).unwrap_err();
    assert!(matches!(
        err,
        Error::Guest(GuestError::NativeCallFailure { code, .. }) if code == ARGON2_MEMORY_ALLOCATION_ERROR
    ));
    assert_eq!(guest.heap_stats().unwrap().live_allocations, 0);
}

#[test]
fn password_hash_trait() {
    let mut argon2id = Argon2idGuest::new(Argon2Guest::new());
    let params = Argon2idParams {
        time_cost: 2,
        memory_cost: 1 << 16,
        parallelism: 1,
        hash_length: 32,
    };
    let mut out = [0u8; 32];
    argon2id
        .hash_password(&params, b"password", b"somesalt", &mut out)
        .unwrap();
    assert_eq!(
        out,
        hex!("09316115d5cf24ed5a15a31a3ba326e5cf32edc24702987c02b6566f61913cf7")
    );
}
