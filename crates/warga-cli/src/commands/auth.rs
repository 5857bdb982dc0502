use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{ArgGroup, Args, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};

use warga_auth::{AuthError, Authenticator, Credentials, PasswordChange};
use warga_data::{LoginAttempt, LoginAttemptFilter, Query, Store, User, UserFilter};

use crate::formatting::PrintFormatted;

#[derive(Subcommand, Debug)]
pub enum Auth {
    /// Check credentials of an account
    #[clap(name = "login")]
    Login(Login),
    /// Change the password of an account
    #[clap(name = "passwd")]
    Passwd(ChangePassword),
    /// Lift account locks
    #[clap(name = "unlock")]
    Unlock(Unlock),
    /// Reset a password to the national id
    #[clap(name = "reset-password")]
    ResetPassword(ResetPassword),
    /// Show the login history
    #[clap(name = "history")]
    History(History),
}

impl Auth {
    pub async fn run<DB: Store>(self, db: &DB, auth: &Authenticator) -> Result<()> {
        match self {
            Auth::Login(cmd) => cmd.run(db, auth).await,
            Auth::Passwd(cmd) => cmd.run(db, auth).await,
            Auth::Unlock(cmd) => cmd.run(db, auth).await,
            Auth::ResetPassword(cmd) => cmd.run(db, auth).await,
            Auth::History(cmd) => cmd.run(db).await,
        }
    }
}

fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    Ok(password)
}

fn prompt_new_password(current: String) -> Result<PasswordChange> {
    let new = prompt_password("New password:")?;
    let confirm = prompt_password("Repeat new password:")?;
    Ok(PasswordChange {
        current,
        new,
        confirm,
    })
}

async fn find_by_email<DB: Store>(db: &DB, email: &str) -> Result<User> {
    let users: Vec<User> = db
        .query(&UserFilter {
            email: Some(email.trim().to_string()),
            ..Default::default()
        })
        .await?;
    users
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no account with email {}", email))
}

#[derive(Args, Debug)]
pub struct Login {
    #[clap(short, long)]
    pub email: Option<String>,
}

impl Login {
    pub async fn run<DB: Store>(self, db: &DB, auth: &Authenticator) -> Result<()> {
        let email = match self.email {
            Some(email) => email,
            None => Text::new("Email:").prompt()?,
        };
        let password = prompt_password("Password:")?;
        let credentials = Credentials {
            email,
            password,
            origin: Some("cli".to_string()),
        };

        let account = match auth.authenticate(db, &credentials, Utc::now()).await {
            Ok(account) => account,
            Err(AuthError::AccountLocked { until }) => {
                return Err(anyhow!(
                    "account locked until {}, ask an administrator to unlock it",
                    until.format("%Y-%m-%d %H:%M:%S UTC")
                ));
            }
            Err(AuthError::AccountInactive) => {
                return Err(anyhow!("account inactive, ask an administrator to reactivate it"));
            }
            Err(err) => return Err(err.into()),
        };
        println!("Welcome {} ({}).", account.name, account.role);

        if account.temporary_password {
            println!("You are using a temporary password, please choose a new one.");
            let change = prompt_new_password(credentials.password)?;
            auth.change_password(db, account.id, &change).await?;
            println!("Password changed.");
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ChangePassword {
    #[clap(short, long)]
    pub email: String,
}

impl ChangePassword {
    pub async fn run<DB: Store>(self, db: &DB, auth: &Authenticator) -> Result<()> {
        let user = find_by_email(db, &self.email).await?;
        let current = prompt_password("Current password:")?;
        let change = prompt_new_password(current)?;
        auth.change_password(db, user.id, &change).await?;
        println!("Password changed.");
        Ok(())
    }
}

#[derive(Args, Debug)]
#[clap(group(ArgGroup::new("target").required(true).args(["id", "all"])))]
pub struct Unlock {
    #[clap(short, long)]
    pub id: Option<u32>,
    /// Unlock every locked account
    #[clap(short, long)]
    pub all: bool,
}

impl Unlock {
    pub async fn run<DB: Store>(self, db: &DB, auth: &Authenticator) -> Result<()> {
        match self.id {
            Some(id) => {
                let user = auth.unlock(db, id).await?;
                println!("Unlocked {} <{}>.", user.name, user.email);
            }
            None => {
                let count = auth.unlock_all(db).await?;
                println!("{} accounts unlocked.", count);
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ResetPassword {
    #[clap(short, long)]
    pub id: u32,
}

impl ResetPassword {
    pub async fn run<DB: Store>(self, db: &DB, auth: &Authenticator) -> Result<()> {
        let message = format!(
            "Reset the password of user {} to their national id?",
            self.id
        );
        let confirm = Confirm::new(&message).with_default(false);
        if !confirm.prompt()? {
            return Ok(());
        }
        let user = auth.reset_password(db, self.id).await?;
        println!(
            "Password of {} <{}> reset, it has to be changed on next login.",
            user.name, user.email
        );
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct History {
    #[clap(short, long)]
    pub user: Option<u32>,
    #[clap(short, long)]
    pub email: Option<String>,
    /// Only failed attempts
    #[clap(short, long)]
    pub failed: bool,
    #[clap(short, long, default_value_t = 50)]
    pub limit: u32,
}

impl History {
    pub async fn run<DB: Store>(self, db: &DB) -> Result<()> {
        let filter = LoginAttemptFilter {
            user_id: self.user,
            email: self.email,
            success: if self.failed { Some(false) } else { None },
            limit: Some(self.limit),
        };
        let attempts: Vec<LoginAttempt> = db.query(&filter).await?;
        attempts.print_formatted();
        Ok(())
    }
}
