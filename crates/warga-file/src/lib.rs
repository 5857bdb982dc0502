//! A flat-file JSON backend. The whole data set lives in one file
//! which is rewritten on every change.

mod store;
pub use store::FileStore;

mod users;
mod payments;
mod login_history;
mod templates;
mod accounts;
