use anyhow::{Context, Result};
use guestcrypt_cipher_traits::Argon2idParams;
use guestcrypt_secret_memory::SecretVec;
use guestcrypt_util::file::LoadValue;
use guestcrypt_util::hex::{hex_decode, HexDisplay};

use super::Command;
use crate::backend;
use crate::cli;
use crate::config::Config;
use crate::facade::Argon2Facade;

impl cli::Hash {
    /// Parameters from the config file, overridden by the command line
    fn params(&self, config: &Config) -> Argon2idParams {
        let mut params = Argon2idParams::from(config.argon2.params);
        if let Some(time_cost) = self.time_cost {
            params.time_cost = time_cost;
        }
        if let Some(memory_cost) = self.memory_cost {
            params.memory_cost = memory_cost;
        }
        if let Some(parallelism) = self.parallelism {
            params.parallelism = parallelism;
        }
        if let Some(hash_length) = self.hash_length {
            params.hash_length = hash_length;
        }
        params
    }
}

impl Command for cli::Hash {
    async fn run(self, config: &Config) -> Result<()> {
        let params = self.params(config);
        let password = SecretVec::load(&self.password_file)?;
        let salt = hex_decode(&self.salt).context("could not parse --salt")?;

        let argon2 = Argon2Facade::new(backend::argon2(config));
        let hash = argon2
            .hash_password(&params, password.secret(), &salt)
            .await?;

        println!("{}", hash.secret().fmt_hex());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_line_overrides_config() {
        let mut config = Config::default();
        config.argon2.params.time_cost = 7;
        config.argon2.params.parallelism = 2;

        let hash = cli::Hash {
            password_file: "pw".into(),
            salt: String::new(),
            time_cost: None,
            memory_cost: Some(64),
            parallelism: Some(1),
            hash_length: None,
        };
        let params = hash.params(&config);
        assert_eq!(params.time_cost, 7);
        assert_eq!(params.memory_cost, 64);
        assert_eq!(params.parallelism, 1);
        assert_eq!(params.hash_length, 32);
    }
}
