use anyhow::Result;
use chrono::Duration;
use clap::{Parser, Subcommand};

use warga_auth::{Authenticator, LockoutPolicy};
use warga_data::Store;

use crate::commands::{Auth, Export, Import, Notify, Payments, Templates, Users};

#[derive(Parser, Debug)]
#[clap(name = "warga", version=env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Database file, a `.json` file selects the JSON store
    #[clap(long, env = "WARGA_DB", default_value = "warga.sqlite3")]
    pub db: String,

    /// Failed logins before an account is locked
    #[clap(long, env = "WARGA_MAX_FAILED_ATTEMPTS", default_value_t = 5)]
    pub max_failed_attempts: u32,

    /// How long a locked account stays locked
    #[clap(long, env = "WARGA_LOCKOUT_MINUTES", default_value_t = 15)]
    pub lockout_minutes: u32,

    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn init() -> Self {
        Self::parse()
    }

    pub fn uses_file_store(&self) -> bool {
        self.db.to_lowercase().ends_with(".json")
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(LockoutPolicy::new(
            self.max_failed_attempts,
            Duration::minutes(self.lockout_minutes.into()),
        ))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage users
    #[clap(subcommand)]
    Users(Users),

    /// Manage payments
    #[clap(subcommand)]
    Payments(Payments),

    /// Login, passwords and locks
    #[clap(subcommand)]
    Auth(Auth),

    /// Import users or payments from CSV
    #[clap(subcommand)]
    Import(Import),

    /// Export users or payments as CSV
    #[clap(subcommand)]
    Export(Export),

    /// Manage message templates
    #[clap(subcommand)]
    Templates(Templates),

    /// Send a template via WhatsApp
    Notify(Notify),
}

impl Command {
    pub async fn run<DB: Store>(self, db: &DB, auth: &Authenticator) -> Result<()> {
        match self {
            Command::Users(cmd) => cmd.run(db).await,
            Command::Payments(cmd) => cmd.run(db).await,
            Command::Auth(cmd) => cmd.run(db, auth).await,
            Command::Import(cmd) => cmd.run(db).await,
            Command::Export(cmd) => cmd.run(db).await,
            Command::Templates(cmd) => cmd.run(db).await,
            Command::Notify(cmd) => cmd.run(db).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_globals() {
        let cli = Cli::try_parse_from([
            "warga",
            "--db",
            "Warga.JSON",
            "--max-failed-attempts",
            "3",
            "auth",
            "unlock",
            "--all",
        ])
        .unwrap();
        assert!(cli.uses_file_store());
        assert_eq!(cli.authenticator().policy().max_failed_attempts, 3);
        assert_eq!(
            cli.authenticator().policy().lockout_duration,
            Duration::minutes(15)
        );
    }

    #[test]
    fn test_unlock_needs_target() {
        assert!(Cli::try_parse_from(["warga", "auth", "unlock"]).is_err());
        assert!(
            Cli::try_parse_from(["warga", "auth", "unlock", "--id", "1", "--all"]).is_err()
        );
    }

    #[test]
    fn test_notify_needs_recipients() {
        assert!(Cli::try_parse_from(["warga", "notify", "--template", "1"]).is_err());
        let cli = Cli::try_parse_from([
            "warga", "notify", "--template", "1", "--pending", "--dry-run",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Notify(_)));
    }
}
