use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use inquire::Confirm;

use warga_auth::{register_account, NewAccount};
use warga_data::{Delete, Query, Retrieve, Role, Store, Update, User, UserFilter};

use crate::commands::today;
use crate::formatting::PrintFormatted;

#[derive(Subcommand, Debug)]
pub enum Users {
    /// Show a user
    #[clap(name = "show")]
    Show(ShowUser),
    /// List users
    #[clap(name = "list")]
    List(ListUsers),
    /// Register a user, the national id becomes the temporary password
    #[clap(name = "add")]
    Add(AddUser),
    /// Update a user
    #[clap(name = "set")]
    Update(UpdateUser),
    /// Delete a user and their payments
    #[clap(name = "delete")]
    Delete(DeleteUser),
    /// Show the payment summary of a user
    #[clap(name = "summary")]
    Summary(UserSummary),
}

impl Users {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        match self {
            Users::Show(cmd) => cmd.run(db).await,
            Users::List(cmd) => cmd.run(db).await,
            Users::Add(cmd) => cmd.run(db).await,
            Users::Update(cmd) => cmd.run(db).await,
            Users::Delete(cmd) => cmd.run(db).await,
            Users::Summary(cmd) => cmd.run(db).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowUser {
    #[clap(short, long)]
    pub id: u32,
}

impl ShowUser {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let user: User = db.retrieve(self.id).await?;
        println!();
        user.print_formatted();
        println!();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListUsers {
    #[clap(short, long)]
    pub id: Option<u32>,
    #[clap(short, long)]
    pub name: Option<String>,
    #[clap(short, long)]
    pub email: Option<String>,
    #[clap(short, long)]
    pub role: Option<Role>,
    /// Only accounts with failed logins or a lock
    #[clap(long)]
    pub locked: bool,
}

impl ListUsers {
    /// Run the command and list users
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let filter = UserFilter {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            locked: if self.locked { Some(true) } else { None },
            ..Default::default()
        };

        let users: Vec<User> = db.query(&filter).await?;
        println!("{} users.", users.len());
        users.print_formatted();

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AddUser {
    #[clap(short, long)]
    pub name: String,
    #[clap(short, long)]
    pub email: String,
    #[clap(long)]
    pub national_id: String,
    #[clap(short, long, default_value = "")]
    pub phone: String,
    #[clap(short, long, default_value = "")]
    pub address: String,
    #[clap(long, default_value = "")]
    pub house_number: String,
    #[clap(short, long, default_value_t = Role::Member)]
    pub role: Role,
    #[clap(long)]
    pub membership_date: Option<NaiveDate>,
}

impl AddUser {
    /// Run the command and register the user
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let account = NewAccount {
            name: self.name,
            email: self.email,
            phone: self.phone,
            national_id: self.national_id,
            address: self.address,
            house_number: self.house_number,
            role: self.role,
            membership_date: self.membership_date.unwrap_or_else(today),
        };

        println!();
        account.print_formatted();
        println!();
        let confirm = Confirm::new("Add user?").with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }

        let user = register_account(db, account).await?;
        println!("User added with id {}.", user.id);
        println!("The national id is the temporary password.");

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UpdateUser {
    #[clap(short, long)]
    pub id: u32,
    #[clap(short, long)]
    pub name: Option<String>,
    #[clap(short, long)]
    pub email: Option<String>,
    #[clap(short, long)]
    pub phone: Option<String>,
    #[clap(long)]
    pub national_id: Option<String>,
    #[clap(short, long)]
    pub address: Option<String>,
    #[clap(long)]
    pub house_number: Option<String>,
    #[clap(short, long)]
    pub role: Option<Role>,
    #[clap(long)]
    pub active: Option<bool>,
    #[clap(long)]
    pub membership_date: Option<NaiveDate>,
}

impl UpdateUser {
    /// Run command and update a user
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let user: User = db.retrieve(self.id).await?;
        let mut update = user.clone();

        if let Some(name) = self.name {
            update.name = name;
        }
        if let Some(email) = self.email {
            update.email = email.trim().to_lowercase();
        }
        if let Some(phone) = self.phone {
            update.phone = phone;
        }
        if let Some(national_id) = self.national_id {
            update.national_id = national_id;
        }
        if let Some(address) = self.address {
            update.address = address;
        }
        if let Some(house_number) = self.house_number {
            update.house_number = house_number;
        }
        if let Some(role) = self.role {
            update.role = role;
        }
        if let Some(active) = self.active {
            update.active = active;
        }
        if let Some(membership_date) = self.membership_date {
            update.membership_date = membership_date;
        }

        println!();
        (user, update.clone()).print_formatted();
        println!();
        let confirm = Confirm::new("Update user?").with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }

        db.update(update).await?;
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteUser {
    #[clap(short, long)]
    pub id: u32,
}

impl DeleteUser {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let user: User = db.retrieve(self.id).await?;
        println!();
        user.print_formatted();
        println!();
        let confirm =
            Confirm::new("Delete user and all their payments?").with_default(false);
        if !confirm.prompt()? {
            return Ok(());
        }
        db.delete(user).await?;
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UserSummary {
    #[clap(short, long)]
    pub id: u32,
}

impl UserSummary {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let user: User = db.retrieve(self.id).await?;
        let payments = user.get_payments(db).await?;
        println!("{} <{}>", user.name, user.email);
        println!();
        payments.print_formatted();
        println!();
        warga_data::PaymentSummary::from_payments(&payments).print_formatted();
        Ok(())
    }
}
