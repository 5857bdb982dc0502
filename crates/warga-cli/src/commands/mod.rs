use chrono::{Local, NaiveDate};

mod users;
pub use users::*;

mod payments;
pub use payments::*;

mod auth;
pub use auth::*;

mod transfer;
pub use transfer::*;

mod templates;
pub use templates::*;

mod notify;
pub use notify::*;

/// The local calendar day
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
