use std::fmt;

/// Writes the contents of an `&[u8]` as hexadecimal symbols to a [std::fmt::Formatter]
///
/// Long arrays such as Kyber keys are abbreviated to their first and last 32 bytes.
pub fn debug_crypto_array(v: &[u8], fmt: &mut fmt::Formatter) -> fmt::Result {
    write!(fmt, "[{}]=", v.len())?;
    let write_bytes = |bytes: &[u8], fmt: &mut fmt::Formatter| -> fmt::Result {
        bytes.iter().try_for_each(|byte| write!(fmt, "{byte:02x}"))
    };
    if v.len() > 64 {
        write_bytes(&v[..32], fmt)?;
        fmt.write_str("…")?;
        write_bytes(&v[v.len() - 32..], fmt)
    } else {
        write_bytes(v, fmt)
    }
}
