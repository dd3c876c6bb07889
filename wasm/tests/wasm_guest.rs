use guestcrypt_guest::{invoke, Arg, GuestError, GuestMemoryExt, GuestModule, Val};
use guestcrypt_wasm::WasmGuest;

const FIXTURE: &str = include_str!("fixture.wat");

fn guest() -> WasmGuest {
    WasmGuest::from_bytes(FIXTURE).unwrap()
}

fn live(guest: &mut WasmGuest) -> i32 {
    guest.call_i32("live", &[]).unwrap()
}

#[test]
fn scalars_and_strings() {
    let mut guest = guest();
    assert_eq!(
        invoke(&mut guest, "add", &mut [Arg::I32(40), 2u32.into()]).unwrap(),
        Some(Val::I32(42))
    );
    assert_eq!(
        invoke(&mut guest, "strlen", &mut [Arg::Text("Kyber1024")]).unwrap(),
        Some(Val::I32(9))
    );
    assert_eq!(live(&mut guest), 0);
}

#[test]
fn mutable_buffers_round_trip_through_wasm_memory() {
    let mut guest = guest();
    let mut data = [0u8, 1, 254];
    invoke(
        &mut guest,
        "increment",
        &mut [Arg::mutable_secure(&mut data), 3u32.into()],
    )
    .unwrap();
    assert_eq!(data, [1, 2, 255]);
    assert_eq!(live(&mut guest), 0);
}

#[test]
fn traps_are_errors_and_cleanup_still_happens() {
    let mut guest = guest();
    let err = invoke(&mut guest, "fail", &mut [Arg::SecureBytes(b"secret")]).unwrap_err();
    assert!(matches!(err, GuestError::Trap { ref function, .. } if function == "fail"));
    assert_eq!(live(&mut guest), 0);
}

#[test]
fn exhausted_memory_yields_allocation_failure() {
    let mut guest = guest();
    let big = vec![0u8; 70 * 1024];
    let err = invoke(&mut guest, "increment", &mut [Arg::Bytes(&big), 0u32.into()]).unwrap_err();
    assert!(matches!(err, GuestError::AllocationFailure { .. }));
}

#[test]
fn missing_exports_and_wrong_arity() {
    let mut guest = guest();
    assert!(matches!(
        guest.call("OQS_KEM_new", &[Val::I32(0)]),
        Err(GuestError::MissingExport(_))
    ));
    assert!(matches!(
        guest.call("add", &[Val::I32(1)]),
        Err(GuestError::SignatureMismatch { expected: 2, .. })
    ));
}

#[test]
fn argument_widths_must_match() {
    let mut guest = guest();
    assert_eq!(guest.call("widen", &[Val::I64(1 << 40)]).unwrap(), Some(Val::I64((1 << 40) + 1)));
    assert!(matches!(
        guest.call("widen", &[Val::I32(1)]),
        Err(GuestError::SignatureMismatch { expected: 1, .. })
    ));
    assert!(matches!(
        guest.call("add", &[Val::I64(1), Val::I32(2)]),
        Err(GuestError::SignatureMismatch { expected: 2, .. })
    ));
}

#[test]
fn several_results_report_the_first() {
    let mut guest = guest();
    let err = guest.call("pair", &[]).unwrap_err();
    assert!(matches!(
        err,
        GuestError::UnexpectedResult { ref function, actual: Some(Val::I32(7)) } if function == "pair"
    ));
}

#[test]
fn memory_access_is_bounds_checked() {
    let mut guest = guest();
    let ptr = guest.malloc(8).unwrap();
    guest.write(ptr, b"12345678").unwrap();
    assert_eq!(guest.read(ptr, 8).unwrap(), b"12345678");
    assert!(guest.read(ptr, 1 << 20).is_err());
    guest.free(ptr).unwrap();
}

#[test]
fn modules_without_allocator_are_rejected() {
    assert!(WasmGuest::from_bytes(r#"(module (memory (export "memory") 1))"#).is_err());
}

#[test]
fn load_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fixture.wat");
    std::fs::write(&path, FIXTURE)?;
    let mut guest = WasmGuest::from_file(&path)?;
    assert_eq!(live(&mut guest), 0);
    assert!(WasmGuest::from_file(dir.path().join("missing.wasm")).is_err());
    Ok(())
}
