//! Contains the code used to parse command line parameters for guestcrypt.
//!
//! [CliArgs::run] is called by the main function and contains the bulk of the
//! bootstrapping code, while the main function just sets up logging.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cmd::Command;
use crate::config::Config;

/// Command line arguments to the guestcrypt binary.
///
/// Used for parsing with [clap].
#[derive(Parser, Debug)]
#[command(author, version, about, long_about, arg_required_else_help = true)]
pub struct CliArgs {
    /// Configuration file selecting the guest modules; defaults apply without one
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Lowest log level to show
    #[arg(long = "log-level", value_name = "LOG_LEVEL", group = "log-level")]
    log_level: Option<log::LevelFilter>,

    /// Show verbose log output – sets log level to "debug"
    #[arg(short, long, group = "log-level")]
    verbose: bool,

    /// Show no log output – sets log level to "error"
    #[arg(short, long, group = "log-level")]
    quiet: bool,

    /// The subcommand to be invoked
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl CliArgs {
    /// returns the log level filter set by CLI args
    /// returns `None` if the user did not specify any log level filter via CLI
    ///
    /// NOTE: the clap feature of ["argument groups"](https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_3/index.html#argument-relations)
    /// ensures that the user can not specify more than one of the possible log level arguments.
    pub fn get_log_level(&self) -> Option<log::LevelFilter> {
        if self.verbose {
            return Some(log::LevelFilter::Debug);
        }
        if self.quiet {
            return Some(log::LevelFilter::Error);
        }
        self.log_level
    }

    /// The configuration named on the command line, or the default one
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Run guestcrypt with the given command line parameters
    pub async fn run(self) -> anyhow::Result<()> {
        use CliCommand::*;
        let config = match &self.command {
            // clap prints the help if no command is given
            None => return Ok(()),
            // gen-config must work without a config file, or with a broken one
            Some(GenConfig(_)) => Config::default(),
            Some(_) => self.load_config()?,
        };

        match self.command {
            None => Ok(()),
            Some(GenConfig(genconfig)) => genconfig.run(&config).await,
            Some(Keygen(keygen)) => keygen.run(&config).await,
            Some(Encaps(encaps)) => encaps.run(&config).await,
            Some(Decaps(decaps)) => decaps.run(&config).await,
            Some(Hash(hash)) => hash.run(&config).await,
        }
    }
}

/// represents a command specified via CLI
#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Write the default configuration to a file
    GenConfig(GenConfig),

    /// Generate a Kyber-1024 key pair
    Keygen(Keygen),

    /// Encapsulate a fresh shared secret to a public key
    Encaps(Encaps),

    /// Recover a shared secret from a ciphertext using a secret key
    Decaps(Decaps),

    /// Hash a password with Argon2id and print the hash as hex
    Hash(Hash),
}

#[derive(Args, Debug)]
pub struct GenConfig {
    pub config_file: PathBuf,

    /// Forcefully overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct Keygen {
    /// Where to write the public key to
    #[arg(long, value_name = "PATH")]
    pub public_key: PathBuf,

    /// Where to write the secret key to; only readable by the owner
    #[arg(long, value_name = "PATH")]
    pub secret_key: PathBuf,

    /// Forcefully overwrite existing key files
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct Encaps {
    /// Public key to encapsulate to
    #[arg(long, value_name = "PATH")]
    pub public_key: PathBuf,

    /// Where to write the ciphertext to
    #[arg(long, value_name = "PATH")]
    pub ciphertext: PathBuf,

    /// Where to write the shared secret to; only readable by the owner
    #[arg(long, value_name = "PATH")]
    pub shared_secret: PathBuf,

    /// Forcefully overwrite existing output files
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct Decaps {
    /// Secret key matching the public key the ciphertext was made for
    #[arg(long, value_name = "PATH")]
    pub secret_key: PathBuf,

    /// Ciphertext produced by `encaps`
    #[arg(long, value_name = "PATH")]
    pub ciphertext: PathBuf,

    /// Where to write the shared secret to; only readable by the owner
    #[arg(long, value_name = "PATH")]
    pub shared_secret: PathBuf,

    /// Forcefully overwrite an existing shared secret file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct Hash {
    /// File holding the password; its exact contents are hashed
    #[arg(long, value_name = "PATH")]
    pub password_file: PathBuf,

    /// Salt as hex, at least 8 bytes
    #[arg(long, value_name = "HEX")]
    pub salt: String,

    /// Number of passes; overrides argon2.params.time_cost
    #[arg(long)]
    pub time_cost: Option<u32>,

    /// Memory in KiB; overrides argon2.params.memory_cost
    #[arg(long)]
    pub memory_cost: Option<u32>,

    /// Number of lanes; overrides argon2.params.parallelism
    #[arg(long)]
    pub parallelism: Option<u32>,

    /// Length of the hash in bytes; overrides argon2.params.hash_length
    #[arg(long)]
    pub hash_length: Option<usize>,
}
