// Operations
mod operations;
pub use operations::*;

mod errors;
pub use errors::*;

// Models
mod users;
pub use users::*;

mod payments;
pub use payments::*;

mod login_history;
pub use login_history::*;

mod templates;
pub use templates::*;

mod accounts;
pub use accounts::*;

mod store;
pub use store::*;
