use guestcrypt_cipher_traits::Kem;
use guestcrypt_ciphers::kem::{Kyber1024Guest, CT_LEN, PK_LEN, SHK_LEN, SK_LEN};
use guestcrypt_ciphers::kyber::{decapsulate, encapsulate, generate_key_pair, KyberPrivateKey};
use guestcrypt_ciphers::{EntropySource, SystemEntropy};
use guestcrypt_guest::GuestModule;
use guestcrypt_oqs::LiboqsGuest;
use guestcrypt_secret_memory::{Secret, SecretVec};

/// Always hands out the same bytes
struct FixedEntropy(u8);

impl EntropySource for FixedEntropy {
    fn generate_random_data(&self, n: usize) -> anyhow::Result<SecretVec> {
        Ok(SecretVec::from_slice(&vec![self.0; n]))
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn encapsulated_secret_is_recovered() {
    let mut guest = LiboqsGuest::new();
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    let enc = encapsulate(&mut guest, &SystemEntropy, &pair.public_key).unwrap();
    let ss = decapsulate(&mut guest, &pair.private_key, &enc.ciphertext.value).unwrap();
    assert_eq!(ss.secret(), enc.shared_secret.secret());
}

#[test]
fn outputs_have_kyber1024_sizes() {
    let mut guest = LiboqsGuest::new();
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    assert_eq!(pair.public_key.as_bytes().len(), 1568);
    assert_eq!(pair.private_key.as_bytes().len(), 3168);

    let enc = encapsulate(&mut guest, &SystemEntropy, &pair.public_key).unwrap();
    assert_eq!(enc.ciphertext.value.len(), 1568);
    assert_eq!(enc.shared_secret.secret().len(), 32);
}

#[test]
fn encapsulation_is_randomized() {
    let mut guest = LiboqsGuest::new();
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    let a = encapsulate(&mut guest, &SystemEntropy, &pair.public_key).unwrap();
    let b = encapsulate(&mut guest, &SystemEntropy, &pair.public_key).unwrap();
    assert_ne!(a.ciphertext, b.ciphertext);
    assert_ne!(a.shared_secret.secret(), b.shared_secret.secret());
}

#[test]
fn keys_are_determined_by_injected_entropy() {
    let a = generate_key_pair(&mut LiboqsGuest::new(), &FixedEntropy(1)).unwrap();
    let b = generate_key_pair(&mut LiboqsGuest::new(), &FixedEntropy(1)).unwrap();
    let c = generate_key_pair(&mut LiboqsGuest::new(), &FixedEntropy(2)).unwrap();
    assert_eq!(a.public_key, b.public_key);
    assert_ne!(a.public_key, c.public_key);
}

#[test]
fn wrong_private_key_yields_a_different_secret() {
    let mut guest = LiboqsGuest::new();
    let alice = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    let mallory = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    let enc = encapsulate(&mut guest, &SystemEntropy, &alice.public_key).unwrap();
    let ss = decapsulate(&mut guest, &mallory.private_key, &enc.ciphertext.value).unwrap();
    assert_ne!(ss.secret(), enc.shared_secret.secret());
}

#[test]
fn repeated_operations_do_not_leak_guest_memory() {
    let mut guest = LiboqsGuest::new();
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    assert_eq!(guest.heap_stats().unwrap().live_allocations, 0);

    let round = |guest: &mut LiboqsGuest| {
        let enc = encapsulate(guest, &SystemEntropy, &pair.public_key).unwrap();
        decapsulate(guest, &pair.private_key, &enc.ciphertext.value).unwrap();
        // induced failure: a truncated ciphertext never reaches the guest
        assert!(decapsulate(guest, &pair.private_key, &enc.ciphertext.value[1..]).is_err());
    };

    round(&mut guest);
    let baseline = guest.heap_stats().unwrap();
    for _ in 0..16 {
        round(&mut guest);
    }

    let after = guest.heap_stats().unwrap();
    assert_eq!(after.live_allocations, 0);
    assert_eq!(after.live_bytes, 0);
    assert_eq!(after.peak_bytes, baseline.peak_bytes);
    assert_eq!(guest.live_contexts(), 0);
}

#[test]
fn secrets_do_not_linger_in_guest_memory() {
    let mut guest = LiboqsGuest::new();
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    // The private key embeds the public key, which is not secret, so only look at its
    // leading part
    let sk_head = &pair.private_key.as_bytes()[..64];
    assert!(!contains(guest.memory(), sk_head));

    let enc = encapsulate(&mut guest, &SystemEntropy, &pair.public_key).unwrap();
    assert!(!contains(guest.memory(), enc.shared_secret.secret()));

    let ss = decapsulate(&mut guest, &pair.private_key, &enc.ciphertext.value).unwrap();
    assert!(!contains(guest.memory(), ss.secret()));
    assert!(!contains(guest.memory(), sk_head));
}

#[test]
fn private_keys_survive_serialization() {
    let mut guest = LiboqsGuest::new();
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    let sk = KyberPrivateKey::from_slice(pair.private_key.as_bytes()).unwrap();
    let enc = encapsulate(&mut guest, &SystemEntropy, &pair.public_key).unwrap();
    let ss = decapsulate(&mut guest, &sk, &enc.ciphertext.value).unwrap();
    assert_eq!(ss.secret(), enc.shared_secret.secret());
}

#[test]
fn kem_trait_round_trip() {
    let mut kem = Kyber1024Guest::new(LiboqsGuest::new(), SystemEntropy);

    let mut sk = Secret::<SK_LEN>::zero();
    let mut pk = [0u8; PK_LEN];
    kem.keygen(sk.secret_mut(), &mut pk).unwrap();

    let mut shk_enc = Secret::<SHK_LEN>::zero();
    let mut ct = [0u8; CT_LEN];
    kem.encaps(shk_enc.secret_mut(), &mut ct, &pk).unwrap();

    let mut shk_dec = Secret::<SHK_LEN>::zero();
    kem.decaps(shk_dec.secret_mut(), sk.secret(), &ct).unwrap();
    assert_eq!(shk_enc.secret(), shk_dec.secret());

    let (guest, _) = kem.into_inner();
    assert_eq!(guest.heap_stats().unwrap().live_allocations, 0);
}

#[test]
fn boxed_modules_work_too() {
    let mut guest: Box<dyn GuestModule + Send> = Box::new(LiboqsGuest::new());
    let pair = generate_key_pair(&mut guest, &SystemEntropy).unwrap();
    let enc = encapsulate(&mut *guest, &SystemEntropy, &pair.public_key).unwrap();
    let ss = decapsulate(&mut guest, &pair.private_key, &enc.ciphertext.value).unwrap();
    assert_eq!(ss.secret(), enc.shared_secret.secret());
}
