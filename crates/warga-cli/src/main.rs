use anyhow::Result;
use tracing_subscriber::EnvFilter;

use warga_cli::cli::Cli;
use warga_db::Connection;
use warga_file::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::init();
    let auth = cli.authenticator();

    if cli.uses_file_store() {
        let db = FileStore::open(&cli.db).await?;
        cli.command.run(&db, &auth).await
    } else {
        let db = Connection::open(&cli.db).await?;
        cli.command.run(&db, &auth).await
    }
}
