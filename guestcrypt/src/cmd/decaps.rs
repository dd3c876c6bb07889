use anyhow::Result;
use guestcrypt_ciphers::kem::{CT_LEN, SK_LEN};
use guestcrypt_ciphers::kyber::KyberPrivateKey;
use guestcrypt_secret_memory::file::StoreSecret;
use guestcrypt_secret_memory::{Public, Secret};
use guestcrypt_util::file::LoadValue;

use super::{check_overwrite, Command};
use crate::backend;
use crate::cli;
use crate::config::Config;
use crate::facade::KyberFacade;

impl Command for cli::Decaps {
    async fn run(self, config: &Config) -> Result<()> {
        check_overwrite(self.force, &[self.shared_secret.as_path()])?;
        let private_key = KyberPrivateKey {
            encoded: Secret::<SK_LEN>::load(&self.secret_key)?,
        };
        let ciphertext = Public::<CT_LEN>::load(&self.ciphertext)?;

        let kyber = KyberFacade::new(backend::liboqs(config));
        let shared_secret = kyber.decapsulate(&private_key, &ciphertext.value).await?;

        shared_secret.store_secret(&self.shared_secret)?;
        Ok(())
    }
}
