use std::fs::File;

use anyhow::Result;
use clap::{Args, Subcommand};
use inquire::Confirm;

use warga_data::{Payment, PaymentFilter, Query, Store, User, UserFilter};
use warga_import::{export, import_payments, import_users, payments, users, ImportReport};

use crate::commands::today;

#[derive(Subcommand, Debug)]
pub enum Import {
    /// Import users, each gets the national id as temporary password
    #[clap(name = "users")]
    Users(ImportFile),
    /// Import payments, users are looked up by email
    #[clap(name = "payments")]
    Payments(ImportFile),
}

#[derive(Args, Debug)]
pub struct ImportFile {
    #[clap(short, long)]
    pub file: String,
    /// Do not ask for confirmation
    #[clap(short, long)]
    pub yes: bool,
}

impl ImportFile {
    fn confirm(&self, valid: usize, invalid: usize) -> Result<bool> {
        println!("{}: {} valid rows, {} invalid rows.", self.file, valid, invalid);
        if self.yes {
            return Ok(true);
        }
        let ok = Confirm::new("Import valid rows?").with_default(true).prompt()?;
        Ok(ok)
    }
}

fn print_report(report: &ImportReport) {
    println!("{} rows imported.", report.imported);
    if !report.is_clean() {
        println!();
        println!("Failed rows:");
        for row in &report.failed {
            println!("  {}", row);
        }
    }
}

impl Import {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        match self {
            Import::Users(cmd) => {
                let rows = users::parse(File::open(&cmd.file)?)?;
                let invalid = rows.iter().filter(|r| r.is_err()).count();
                if !cmd.confirm(rows.len() - invalid, invalid)? {
                    return Ok(());
                }
                let report = import_users(db, rows, today()).await;
                print_report(&report);
            }
            Import::Payments(cmd) => {
                let rows = payments::parse(File::open(&cmd.file)?)?;
                let invalid = rows.iter().filter(|r| r.is_err()).count();
                if !cmd.confirm(rows.len() - invalid, invalid)? {
                    return Ok(());
                }
                let report = import_payments(db, rows).await;
                print_report(&report);
            }
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Export {
    /// Export all users
    #[clap(name = "users")]
    Users(ExportFile),
    /// Export all payments
    #[clap(name = "payments")]
    Payments(ExportFile),
}

#[derive(Args, Debug)]
pub struct ExportFile {
    #[clap(short, long)]
    pub file: String,
}

impl Export {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let users: Vec<User> = db.query(&UserFilter::default()).await?;
        match self {
            Export::Users(cmd) => {
                let count = export::users(File::create(&cmd.file)?, &users)?;
                println!("{} users written to {}.", count, cmd.file);
            }
            Export::Payments(cmd) => {
                let payments: Vec<Payment> = db.query(&PaymentFilter::default()).await?;
                let count = export::payments(File::create(&cmd.file)?, &payments, &users)?;
                println!("{} payments written to {}.", count, cmd.file);
            }
        }
        Ok(())
    }
}
