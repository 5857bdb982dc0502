use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clap::{ArgGroup, Args};
use inquire::Confirm;

use warga_data::{
    Payment, PaymentFilter, PaymentStatus, Query, Retrieve, Store, Template, User,
};
use warga_notify::{
    notify_all, Dispatcher, Message, NotifyError, WhatsAppClient, WhatsAppConfig,
};

/// Prints messages instead of sending them
struct DryRun;

#[async_trait]
impl Dispatcher for DryRun {
    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        println!("To: +{}", message.phone);
        println!("{}", message.body);
        println!();
        Ok(())
    }
}

#[derive(Args, Debug)]
#[clap(group(ArgGroup::new("recipients").required(true).args(["user", "pending"])))]
pub struct Notify {
    /// Template id
    #[clap(short, long)]
    pub template: u32,
    /// Send to a single user
    #[clap(short, long)]
    pub user: Option<u32>,
    /// Send to every user with a pending or overdue payment
    #[clap(short, long)]
    pub pending: bool,
    /// Print the messages instead of sending them
    #[clap(long)]
    pub dry_run: bool,

    #[clap(long, env = "WARGA_WHATSAPP_API_URL", default_value = "")]
    pub api_url: String,
    #[clap(long, env = "WARGA_WHATSAPP_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,
    /// Replaces the leading 0 of national numbers
    #[clap(long, env = "WARGA_COUNTRY_CODE", default_value = "62")]
    pub country_code: String,
}

/// Oldest open payment of each user
fn open_payments(payments: Vec<Payment>) -> HashMap<u32, Payment> {
    let mut open: HashMap<u32, Payment> = HashMap::new();
    for payment in payments {
        if payment.status == PaymentStatus::Paid {
            continue;
        }
        match open.get(&payment.user_id) {
            Some(known) if (known.date, known.id) <= (payment.date, payment.id) => {}
            _ => {
                open.insert(payment.user_id, payment);
            }
        }
    }
    open
}

impl Notify {
    async fn recipients<DB: Store>(&self, db: &DB) -> Result<Vec<(User, Option<Payment>)>> {
        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                user_id: self.user,
                ..Default::default()
            })
            .await?;
        let mut open = open_payments(payments);

        if let Some(id) = self.user {
            let user: User = db.retrieve(id).await?;
            let payment = open.remove(&user.id);
            return Ok(vec![(user, payment)]);
        }

        let mut recipients = vec![];
        let mut ids: Vec<u32> = open.keys().copied().collect();
        ids.sort();
        for id in ids {
            let user: User = db.retrieve(id).await?;
            if !user.active {
                continue;
            }
            let payment = open.remove(&id);
            recipients.push((user, payment));
        }
        Ok(recipients)
    }

    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let template: Template = db.retrieve(self.template).await?;
        let recipients = self.recipients(db).await?;
        if recipients.is_empty() {
            println!("Nobody to notify.");
            return Ok(());
        }

        let report = if self.dry_run {
            notify_all(&DryRun, &template, &recipients, &self.country_code).await
        } else {
            if self.api_url.is_empty() {
                return Err(anyhow!(
                    "no WhatsApp gateway configured, set WARGA_WHATSAPP_API_URL"
                ));
            }
            let message = format!(
                "Send '{}' to {} users?",
                template.name,
                recipients.len()
            );
            let confirm = Confirm::new(&message).with_default(true);
            if !confirm.prompt()? {
                return Ok(());
            }
            let client = WhatsAppClient::new(WhatsAppConfig {
                api_url: self.api_url.clone(),
                token: self.token.clone(),
                country_code: self.country_code.clone(),
            });
            notify_all(&client, &template, &recipients, client.country_code()).await
        };

        println!("{} messages sent.", report.sent);
        for (user_id, err) in &report.failed {
            println!("  user {}: {}", user_id, err);
        }
        Ok(())
    }
}
