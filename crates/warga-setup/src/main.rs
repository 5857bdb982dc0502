use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tracing_subscriber::EnvFilter;

use warga_auth::{register_account_with_password, NewAccount};
use warga_data::{Role, Store};
use warga_db::{schema, Connection};
use warga_file::FileStore;

#[derive(Parser, Debug)]
#[clap(name = "warga-setup", version=env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[clap(long, env = "WARGA_DB", default_value = "warga.sqlite3")]
    pub db: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database
    Init,
    /// Create an administrator account with a chosen password
    Admin(Admin),
}

#[derive(Args, Debug)]
pub struct Admin {
    #[clap(short, long)]
    pub name: String,
    #[clap(short, long)]
    pub email: String,
    #[clap(long, default_value = "")]
    pub national_id: String,
    #[clap(short, long, default_value = "")]
    pub phone: String,
}

fn is_file_store(db: &str) -> bool {
    db.to_lowercase().ends_with(".json")
}

/// Initialize the database
async fn db_init(filename: &str) -> Result<()> {
    if is_file_store(filename) {
        let store = FileStore::open(filename).await?;
        store.create().await?;
        tracing::info!(path = %store.path().display(), "file store created");
        println!("Created {}.", store.path().display());
        return Ok(());
    }
    let conn = Connection::open(filename).await?;
    schema::install(&conn).await?;
    tracing::info!(filename, "schema installed");
    println!("Installed schema in {}.", filename);
    Ok(())
}

async fn add_admin<DB: Store>(db: &DB, admin: Admin) -> Result<()> {
    let password = Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;

    let account = NewAccount {
        name: admin.name,
        email: admin.email,
        phone: admin.phone,
        national_id: admin.national_id,
        role: Role::Admin,
        membership_date: Local::now().date_naive(),
        ..Default::default()
    };
    let user = register_account_with_password(db, account, &password)
        .await
        .map_err(|e| anyhow!("could not create administrator: {}", e))?;
    tracing::info!(user_id = user.id, email = %user.email, "administrator created");
    println!("Administrator {} <{}> created with id {}.", user.name, user.email, user.id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Init => db_init(&cli.db).await?,
        Command::Admin(admin) => {
            if is_file_store(&cli.db) {
                let db = FileStore::open(&cli.db).await?;
                add_admin(&db, admin).await?;
            } else {
                let db = Connection::open(&cli.db).await?;
                add_admin(&db, admin).await?;
            }
        }
    }
    Ok(())
}
