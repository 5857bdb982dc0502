pub mod connection;
pub use connection::Connection;

pub mod results;
pub use results::Id;

pub mod schema;

pub mod users;
pub mod payments;
pub mod login_history;
pub mod templates;
pub mod accounts;
