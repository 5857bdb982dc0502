use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use inquire::Confirm;

use warga_data::{
    mark_overdue, record_payment, Payment, PaymentFilter, PaymentStatus, Query, Retrieve,
    Store, Update, User, UserFilter,
};

use crate::commands::today;
use crate::formatting::PrintFormatted;

#[derive(Subcommand, Debug)]
pub enum Payments {
    /// List payments
    #[clap(name = "list")]
    List(ListPayments),
    /// Record a payment
    #[clap(name = "add")]
    Add(AddPayment),
    /// Change the status of a payment
    #[clap(name = "status")]
    Status(SetPaymentStatus),
    /// Mark pending payments of past days as overdue
    #[clap(name = "mark-overdue")]
    MarkOverdue(MarkOverdue),
}

impl Payments {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        match self {
            Payments::List(cmd) => cmd.run(db).await,
            Payments::Add(cmd) => cmd.run(db).await,
            Payments::Status(cmd) => cmd.run(db).await,
            Payments::MarkOverdue(cmd) => cmd.run(db).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListPayments {
    #[clap(short, long)]
    pub user: Option<u32>,
    #[clap(short, long)]
    pub status: Option<PaymentStatus>,
    #[clap(long)]
    pub from: Option<NaiveDate>,
    #[clap(long)]
    pub until: Option<NaiveDate>,
}

impl ListPayments {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let filter = PaymentFilter {
            user_id: self.user,
            status: self.status,
            date_after: self.from,
            date_before: self.until,
            ..Default::default()
        };
        let payments: Vec<Payment> = db.query(&filter).await?;
        println!("{} payments.", payments.len());
        payments.print_formatted();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AddPayment {
    #[clap(short, long)]
    pub user: u32,
    #[clap(short, long)]
    pub amount: f64,
    #[clap(short, long)]
    pub date: Option<NaiveDate>,
    #[clap(short, long, default_value_t = PaymentStatus::Pending)]
    pub status: PaymentStatus,
    #[clap(short, long, default_value = "")]
    pub method: String,
    #[clap(short, long, default_value = "")]
    pub reference: String,
}

impl AddPayment {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let users: Vec<User> = db
            .query(&UserFilter {
                id: Some(self.user),
                ..Default::default()
            })
            .await?;
        if let Some(user) = users.first() {
            println!("{} <{}>", user.name, user.email);
        }

        let payment = Payment {
            user_id: self.user,
            amount: self.amount,
            date: self.date.unwrap_or_else(today),
            status: self.status,
            method: self.method,
            reference: self.reference,
            ..Default::default()
        };
        payment.print_formatted();
        println!();
        let confirm = Confirm::new("Record payment?").with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }

        let payment = record_payment(db, payment).await?;
        println!("Payment recorded with id {}.", payment.id);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct SetPaymentStatus {
    #[clap(short, long)]
    pub id: u32,
    #[clap(short, long)]
    pub status: PaymentStatus,
}

impl SetPaymentStatus {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let payment: Payment = db.retrieve(self.id).await?;
        let old = payment.status;
        let payment = db
            .update(Payment {
                status: self.status,
                ..payment
            })
            .await?;
        println!("Payment {}: {} -> {}", payment.id, old, payment.status);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct MarkOverdue {
    /// Reference day, defaults to today
    #[clap(short, long)]
    pub today: Option<NaiveDate>,
}

impl MarkOverdue {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let count = mark_overdue(db, self.today.unwrap_or_else(today)).await?;
        println!("{} payments marked overdue.", count);
        Ok(())
    }
}
