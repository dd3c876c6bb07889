use guestcrypt_argon2::codes::*;
use guestcrypt_argon2::Argon2Guest;
use guestcrypt_guest::{invoke, Arg, GuestModule, LinearMemory, Val};
use hex_literal::hex;

fn hash_raw(guest: &mut Argon2Guest, t: u32, m: u32, p: u32, pwd: &[u8], salt: &[u8], hash: &mut [u8]) -> i32 {
    let (pwd_len, salt_len, hash_len) = (pwd.len() as u32, salt.len() as u32, hash.len() as u32);
    let res = invoke(
        guest,
        "argon2id_hash_raw",
        &mut [
            t.into(),
            m.into(),
            p.into(),
            Arg::SecureBytes(pwd),
            pwd_len.into(),
            Arg::Bytes(salt),
            salt_len.into(),
            Arg::mutable_secure(hash),
            hash_len.into(),
        ],
    )
    .unwrap();
    res.and_then(Val::as_i32).unwrap()
}

#[test]
fn reference_vector() {
    // From the Argon2 reference implementation's test suite (version 0x13)
    let mut guest = Argon2Guest::new();
    let mut hash = [0u8; 32];
    let code = hash_raw(&mut guest, 2, 1 << 16, 1, b"password", b"somesalt", &mut hash);
    assert_eq!(code, ARGON2_OK);
    assert_eq!(
        hash,
        hex!("09316115d5cf24ed5a15a31a3ba326e5cf32edc24702987c02b6566f61913cf7")
    );
    assert_eq!(guest.heap_stats().unwrap().live_allocations, 0);
}

#[test]
fn parameter_errors_use_the_reference_codes() {
    let mut guest = Argon2Guest::new();
    let mut hash = [0u8; 32];
    let mut run = |t, m, p, salt: &[u8], hash: &mut [u8]| hash_raw(&mut guest, t, m, p, b"pw", salt, hash);

    assert_eq!(run(1, 64, 1, b"short", &mut hash), ARGON2_SALT_TOO_SHORT);
    assert_eq!(run(0, 64, 1, b"somesalt", &mut hash), ARGON2_TIME_TOO_SMALL);
    assert_eq!(run(1, 64, 0, b"somesalt", &mut hash), ARGON2_LANES_TOO_FEW);
    assert_eq!(run(1, 4, 1, b"somesalt", &mut hash), ARGON2_MEMORY_TOO_LITTLE);
    assert_eq!(run(1, 64, 1, b"somesalt", &mut hash[..3]), ARGON2_OUTPUT_TOO_SHORT);
    assert_eq!(hash, [0u8; 32]);
}

#[test]
fn memory_beyond_the_budget_fails_to_allocate() {
    let mut guest = Argon2Guest::with_memory(LinearMemory::default(), 1024);
    let mut hash = [0u8; 16];
    assert_eq!(
        hash_raw(&mut guest, 1, 2048, 1, b"pw", b"somesalt", &mut hash),
        ARGON2_MEMORY_ALLOCATION_ERROR
    );
    assert_eq!(
        hash_raw(&mut guest, 1, 1024, 1, b"pw", b"somesalt", &mut hash),
        ARGON2_OK
    );
}

#[test]
fn null_pointers_with_lengths_are_mismatches() {
    let mut guest = Argon2Guest::new();
    let hash = guest.malloc(32).unwrap();
    let salt = guest.malloc(8).unwrap();
    let call = |guest: &mut Argon2Guest, pwd: Val, hash_ptr: Val| {
        guest
            .call(
                "argon2id_hash_raw",
                &[1u32.into(), 64u32.into(), 1u32.into(), pwd, 4u32.into(), salt.into(), 8u32.into(), hash_ptr, 32u32.into()],
            )
            .unwrap()
            .and_then(Val::as_i32)
            .unwrap()
    };

    assert_eq!(call(&mut guest, Val::I32(0), hash.into()), ARGON2_PWD_PTR_MISMATCH);
    assert_eq!(call(&mut guest, salt.into(), Val::I32(0)), ARGON2_OUTPUT_PTR_NULL);
}

#[test]
fn unknown_exports_are_reported() {
    let mut guest = Argon2Guest::new();
    assert!(guest.call("argon2i_hash_raw", &[]).is_err());
}
