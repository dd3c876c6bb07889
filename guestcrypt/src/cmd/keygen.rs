use anyhow::Result;
use guestcrypt_secret_memory::file::StoreSecret;
use guestcrypt_util::file::StoreValue;

use super::{check_overwrite, Command};
use crate::backend;
use crate::cli;
use crate::config::Config;
use crate::facade::KyberFacade;

impl Command for cli::Keygen {
    async fn run(self, config: &Config) -> Result<()> {
        check_overwrite(self.force, &[self.public_key.as_path(), self.secret_key.as_path()])?;

        let kyber = KyberFacade::new(backend::liboqs(config));
        let pair = kyber.generate_key_pair().await?;

        pair.private_key.encoded.store_secret(&self.secret_key)?;
        pair.public_key.encoded.store(&self.public_key)?;
        log::info!(
            "generated key pair {:?} and {:?}",
            self.public_key,
            self.secret_key
        );
        Ok(())
    }
}
