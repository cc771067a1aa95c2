//! CLI argument parsing and subcommand dispatch.

use clap::{Parser, Subcommand};
use tracing::info;

use dayabase_core::Config;

use crate::startup;

/// dayabase: encrypted connection registry and ad-hoc SQL runner.
#[derive(Parser, Debug)]
#[command(name = "dayabase", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Print the ciphertext for a secret under the configured key and IV.
    Encrypt {
        /// Plaintext secret to encrypt.
        plaintext: String,
    },
    /// Validate configuration and key material, then exit.
    CheckConfig,
}

pub async fn dispatch(config: &Config, command: Option<Command>) -> anyhow::Result<()> {
    match command.unwrap_or(Command::Serve) {
        Command::Serve => startup::serve(config).await,
        Command::Encrypt { plaintext } => {
            let cipher = startup::load_cipher(config)?;
            println!("{}", cipher.encrypt(&plaintext));
            Ok(())
        }
        Command::CheckConfig => {
            config.log_summary();
            startup::load_cipher(config)?;
            info!("Configuration OK");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["dayabase"]).unwrap();
        assert_eq!(cli.command, None);

        let cli = Cli::try_parse_from(["dayabase", "encrypt", "hunter2"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Encrypt {
                plaintext: "hunter2".into()
            })
        );

        let cli = Cli::try_parse_from(["dayabase", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Command::CheckConfig));

        assert!(Cli::try_parse_from(["dayabase", "encrypt"]).is_err());
    }
}
