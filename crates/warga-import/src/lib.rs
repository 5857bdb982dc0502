mod errors;
pub use errors::*;

pub mod fields;

pub mod users;
pub use users::{import_users, UserRecord};

pub mod payments;
pub use payments::{import_payments, PaymentRecord};

pub mod export;
