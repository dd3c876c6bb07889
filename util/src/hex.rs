//! Hex encoding for key material and salts on the command line

use std::fmt::{self, Display};

use zeroize::Zeroize;

/// Formats bytes as lowercase hex without building an intermediate string
pub struct HexDisplayHelper<'a>(&'a [u8]);

impl Display for HexDisplayHelper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pair = [0u8; 2];
        for byte in self.0 {
            // Cannot fail, the output buffer has exactly the right size
            hex::encode_to_slice([*byte], &mut pair).map_err(|_| fmt::Error)?;
            let res = f.write_str(std::str::from_utf8(&pair).map_err(|_| fmt::Error)?);
            pair.zeroize();
            res?;
        }
        Ok(())
    }
}

pub trait HexDisplay {
    fn fmt_hex(&self) -> HexDisplayHelper<'_>;
}

impl<T: AsRef<[u8]> + ?Sized> HexDisplay for T {
    fn fmt_hex(&self) -> HexDisplayHelper<'_> {
        HexDisplayHelper(self.as_ref())
    }
}

/// Decode a hex string, ignoring surrounding whitespace
pub fn hex_decode(input: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(input.trim()).map_err(|e| anyhow::anyhow!("invalid hex string: {e}"))
}
