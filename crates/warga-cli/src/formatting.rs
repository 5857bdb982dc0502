use chrono::{DateTime, Utc};

use warga_auth::NewAccount;
use warga_data::{LoginAttempt, Payment, PaymentSummary, Template, User};

macro_rules! next_attr {
    ($old:ident, $new:ident, $attr:ident) => {
        if $old.$attr != $new.$attr {
            format!(" -> {}", $new.$attr)
        } else {
            "".to_string()
        }
    };
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

pub trait PrintFormatted {
    fn print_formatted(&self);
}

impl PrintFormatted for User {
    fn print_formatted(&self) {
        let password = if self.temporary_password {
            "temporary"
        } else {
            "set"
        };

        println!("Name:\t\t\t{}", self.name);
        println!("Email:\t\t\t{}", self.email);
        println!("Phone:\t\t\t{}", self.phone);
        println!("Address:\t\t{}", self.address);
        println!("House:\t\t\t{}", self.house_number);
        println!("Role:\t\t\t{}", self.role);
        println!("Active:\t\t\t{}", self.active);
        println!("Member since:\t\t{}", self.membership_date);
        println!("Password:\t\t{}", password);
        println!("Failed attempts:\t{}", self.failed_attempts);
        println!("Locked until:\t\t{}", format_time(self.locked_until));
        println!("Last login:\t\t{}", format_time(self.last_login_at));
    }
}

impl PrintFormatted for (User, User) {
    fn print_formatted(&self) {
        let (old, new) = self;

        let next_name = next_attr!(old, new, name);
        println!("Name:\t\t\t{}{}", old.name, next_name);
        let next_email = next_attr!(old, new, email);
        println!("Email:\t\t\t{}{}", old.email, next_email);
        let next_phone = next_attr!(old, new, phone);
        println!("Phone:\t\t\t{}{}", old.phone, next_phone);
        let next_national_id = next_attr!(old, new, national_id);
        println!("National ID:\t\t{}{}", old.national_id, next_national_id);
        let next_address = next_attr!(old, new, address);
        println!("Address:\t\t{}{}", old.address, next_address);
        let next_house = next_attr!(old, new, house_number);
        println!("House:\t\t\t{}{}", old.house_number, next_house);
        let next_role = next_attr!(old, new, role);
        println!("Role:\t\t\t{}{}", old.role, next_role);
        let next_active = next_attr!(old, new, active);
        println!("Active:\t\t\t{}{}", old.active, next_active);
        let next_membership_date = next_attr!(old, new, membership_date);
        println!(
            "Member since:\t\t{}{}",
            old.membership_date, next_membership_date
        );
    }
}

impl PrintFormatted for Vec<User> {
    fn print_formatted(&self) {
        println!(
            "{:>4}\t{:<24}\t{:<30}\t{:<16}\t{:<8}\t{:<8}\t{}",
            "ID", "Name", "Email", "Phone", "House", "Role", "Locked"
        );
        println!("{:-<120}", "-");

        for user in self {
            let locked = if user.locked_until.is_some() { "*" } else { "" };
            println!(
                "{:>4}\t{:<24}\t{:<30}\t{:<16}\t{:<8}\t{:<8}\t{}",
                user.id, user.name, user.email, user.phone, user.house_number, user.role.to_string(), locked
            );
        }
    }
}

impl PrintFormatted for NewAccount {
    fn print_formatted(&self) {
        println!("Name:\t\t\t{}", self.name);
        println!("Email:\t\t\t{}", self.email);
        println!("Phone:\t\t\t{}", self.phone);
        println!("National ID:\t\t{}", self.national_id);
        println!("Address:\t\t{}", self.address);
        println!("House:\t\t\t{}", self.house_number);
        println!("Role:\t\t\t{}", self.role);
        println!("Member since:\t\t{}", self.membership_date);
    }
}

impl PrintFormatted for Payment {
    fn print_formatted(&self) {
        println!("Amount:\t\t\t{:.2}", self.amount);
        println!("Date:\t\t\t{}", self.date);
        println!("Status:\t\t\t{}", self.status);
        println!("Method:\t\t\t{}", self.method);
        println!("Reference:\t\t{}", self.reference);
    }
}

impl PrintFormatted for Vec<Payment> {
    fn print_formatted(&self) {
        println!(
            "{:>4}\t{:>4}\t{:<10}\t{:>12}\t{:<8}\t{:<12}\t{}",
            "ID", "User", "Date", "Amount", "Status", "Method", "Reference"
        );
        println!("{:-<100}", "-");
        for payment in self {
            println!(
                "{:>4}\t{:>4}\t{:<10}\t{:>12.2}\t{:<8}\t{:<12}\t{}",
                payment.id,
                payment.user_id,
                payment.date,
                payment.amount,
                payment.status.to_string(),
                payment.method,
                payment.reference,
            );
        }
    }
}

impl PrintFormatted for PaymentSummary {
    fn print_formatted(&self) {
        let status = match self.status {
            Some(status) => status.to_string(),
            None => "None".to_string(),
        };
        println!("Total paid:\t\t{:.2}", self.total_paid);
        println!("Outstanding:\t\t{:.2}", self.outstanding);
        println!("Latest status:\t\t{}", status);
    }
}

impl PrintFormatted for Vec<LoginAttempt> {
    fn print_formatted(&self) {
        println!(
            "{:<19}\t{:>4}\t{:<30}\t{:<7}\t{:<16}\t{}",
            "Time", "User", "Email", "Result", "Reason", "Origin"
        );
        println!("{:-<110}", "-");
        for attempt in self {
            let user = match attempt.user_id {
                Some(id) => id.to_string(),
                None => "-".to_string(),
            };
            let result = if attempt.success { "ok" } else { "failed" };
            let reason = match attempt.reason {
                Some(reason) => reason.to_string(),
                None => "".to_string(),
            };
            println!(
                "{:<19}\t{:>4}\t{:<30}\t{:<7}\t{:<16}\t{}",
                format_time(Some(attempt.attempted_at)),
                user,
                attempt.email,
                result,
                reason,
                attempt.origin.as_deref().unwrap_or(""),
            );
        }
    }
}

impl PrintFormatted for Template {
    fn print_formatted(&self) {
        println!("Name:\t\t\t{}", self.name);
        println!("Body:\t\t\t{}", self.body);
    }
}

impl PrintFormatted for Vec<Template> {
    fn print_formatted(&self) {
        println!("{:>4}\t{:<24}\t{}", "ID", "Name", "Body");
        println!("{:-<100}", "-");
        for template in self {
            println!("{:>4}\t{:<24}\t{}", template.id, template.name, template.body);
        }
    }
}
