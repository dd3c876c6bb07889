//! Configuration readable from a config file.
//!
//! guestcrypt reads its configuration from a TOML file. It selects, for each of the
//! two guest modules, whether the in-process native build or a WebAssembly build is
//! used, and holds the default Argon2id parameters. Every section and every field is
//! optional; a missing config file is equivalent to [Config::default].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use guestcrypt_argon2::DEFAULT_MAX_MEMORY_COST;
use guestcrypt_cipher_traits::password_hash_argon2id as argon2id;
use guestcrypt_cipher_traits::Argon2idParams;
use guestcrypt_util::file::{fopen_w, Overwrite, Visibility};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// the module providing `OQS_KEM_*` and `TUTA_inject_entropy`
    #[serde(default)]
    pub liboqs: LiboqsConfig,

    /// the module providing `argon2id_hash_raw`
    #[serde(default)]
    pub argon2: Argon2Config,

    /// path to the file which provided this configuration
    ///
    /// Not read from the TOML but set by [Config::load].
    #[serde(skip)]
    pub config_file_path: PathBuf,
}

/// Where a guest module comes from
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Compiled into this binary
    #[default]
    Native,
    /// A `.wasm` file, run by wasmtime
    Wasm,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiboqsConfig {
    #[serde(default)]
    pub backend: Backend,

    /// path to the `.wasm` file; required for the wasm backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Config {
    #[serde(default)]
    pub backend: Backend,

    /// path to the `.wasm` file; required for the wasm backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<PathBuf>,

    /// largest memory cost in KiB the native backend agrees to
    #[serde(default = "default_max_memory_cost")]
    pub max_memory_cost: u32,

    /// parameters used when the command line does not override them
    #[serde(default)]
    pub params: HashParams,
}

fn default_max_memory_cost() -> u32 {
    DEFAULT_MAX_MEMORY_COST
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            module: None,
            max_memory_cost: DEFAULT_MAX_MEMORY_COST,
            params: HashParams::default(),
        }
    }
}

/// Serializable form of [Argon2idParams]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    pub time_cost: u32,
    /// in KiB
    pub memory_cost: u32,
    pub parallelism: u32,
    pub hash_length: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            time_cost: argon2id::DEFAULT_TIME_COST,
            memory_cost: argon2id::DEFAULT_MEMORY_COST,
            parallelism: argon2id::DEFAULT_PARALLELISM,
            hash_length: argon2id::DEFAULT_HASH_LEN,
        }
    }
}

impl From<HashParams> for Argon2idParams {
    fn from(p: HashParams) -> Self {
        Argon2idParams {
            time_cost: p.time_cost,
            memory_cost: p.memory_cost,
            parallelism: p.parallelism,
            hash_length: p.hash_length,
        }
    }
}

impl Config {
    /// load configuration from a TOML file
    ///
    /// Relative module paths are taken relative to the directory holding the file.
    /// No validation is conducted, see [Config::validate].
    pub fn load<P: AsRef<Path>>(p: P) -> anyhow::Result<Self> {
        let p = p.as_ref();
        let text = fs::read_to_string(p).with_context(|| format!("could not read config file {p:?}"))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("could not parse config file {p:?}"))?;

        let base = p.parent().unwrap_or(Path::new(""));
        for module in [&mut config.liboqs.module, &mut config.argon2.module] {
            if let Some(path) = module.as_mut().filter(|m| m.is_relative()) {
                *path = base.join(&*path);
            }
        }

        config.config_file_path = p.to_owned();
        Ok(config)
    }

    /// Write a config to a file
    pub fn store<P: AsRef<Path>>(&self, p: P, overwrite: Overwrite) -> anyhow::Result<()> {
        let p = p.as_ref();
        let serialized = toml::to_string_pretty(&self)?;
        fopen_w(p, Visibility::Public, overwrite)
            .with_context(|| format!("could not open {p:?} for writing"))?
            .write_all(serialized.as_bytes())?;
        Ok(())
    }

    /// Check the configuration for problems that parsing can not catch
    pub fn validate(&self) -> anyhow::Result<()> {
        check_module("liboqs", self.liboqs.backend, self.liboqs.module.as_deref())?;
        check_module("argon2", self.argon2.backend, self.argon2.module.as_deref())?;

        let params = &self.argon2.params;
        ensure!(params.time_cost >= 1, "argon2.params.time_cost must be at least 1");
        ensure!(params.parallelism >= 1, "argon2.params.parallelism must be at least 1");
        ensure!(
            params.memory_cost >= 8 * params.parallelism,
            "argon2.params.memory_cost must be at least 8 KiB per lane, got {} KiB for {} lanes",
            params.memory_cost,
            params.parallelism
        );
        ensure!(params.hash_length >= 4, "argon2.params.hash_length must be at least 4 bytes");
        if self.argon2.backend == Backend::Native {
            ensure!(
                params.memory_cost <= self.argon2.max_memory_cost,
                "argon2.params.memory_cost ({} KiB) exceeds argon2.max_memory_cost ({} KiB)",
                params.memory_cost,
                self.argon2.max_memory_cost
            );
        }
        Ok(())
    }
}

fn check_module(section: &str, backend: Backend, module: Option<&Path>) -> anyhow::Result<()> {
    match (backend, module) {
        (Backend::Wasm, None) => {
            anyhow::bail!("{section}.module is required when {section}.backend = \"wasm\"")
        }
        (Backend::Wasm, Some(path)) => ensure!(
            path.is_file(),
            "could not find {section} module {path:?}: no such file"
        ),
        (Backend::Native, Some(_)) => {
            log::warn!("{section}.module is ignored since {section}.backend = \"native\"")
        }
        (Backend::Native, None) => {}
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.argon2.params.memory_cost, 32 * 1024);
        assert_eq!(config.argon2.max_memory_cost, DEFAULT_MAX_MEMORY_COST);
        config.validate().unwrap();
    }

    #[test]
    fn partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [liboqs]
            backend = "wasm"
            module = "/nonexistent/liboqs.wasm"

            [argon2.params]
            time_cost = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.liboqs.backend, Backend::Wasm);
        assert_eq!(config.argon2.backend, Backend::Native);
        assert_eq!(config.argon2.params.time_cost, 2);
        assert_eq!(config.argon2.params.hash_length, 32);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("liboqs"));
    }

    #[test]
    fn wasm_backend_needs_a_module() {
        let mut config = Config::default();
        config.argon2.backend = Backend::Wasm;
        assert!(config.validate().is_err());
    }

    #[test]
    fn memory_cost_is_checked_against_budget() {
        let mut config = Config::default();
        config.argon2.max_memory_cost = 1024;
        assert!(config.validate().is_err());

        config.argon2.params.memory_cost = 1024;
        config.validate().unwrap();

        config.argon2.params.parallelism = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backends_are_rejected() {
        assert!(toml::from_str::<Config>("[liboqs]\nbackend = \"jvm\"").is_err());
    }
}
