use anyhow::Result;
use guestcrypt_ciphers::kem::PK_LEN;
use guestcrypt_ciphers::kyber::KyberPublicKey;
use guestcrypt_secret_memory::file::StoreSecret;
use guestcrypt_secret_memory::Public;
use guestcrypt_util::file::{LoadValue, StoreValue};

use super::{check_overwrite, Command};
use crate::backend;
use crate::cli;
use crate::config::Config;
use crate::facade::KyberFacade;

impl Command for cli::Encaps {
    async fn run(self, config: &Config) -> Result<()> {
        check_overwrite(self.force, &[self.ciphertext.as_path(), self.shared_secret.as_path()])?;
        let public_key = KyberPublicKey {
            encoded: Public::<PK_LEN>::load(&self.public_key)?,
        };

        let kyber = KyberFacade::new(backend::liboqs(config));
        let enc = kyber.encapsulate(&public_key).await?;

        enc.ciphertext.store(&self.ciphertext)?;
        enc.shared_secret.store_secret(&self.shared_secret)?;
        Ok(())
    }
}
