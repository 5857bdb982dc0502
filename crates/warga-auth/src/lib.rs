mod errors;
pub use errors::*;

mod password;
pub use password::*;

mod policy;
pub use policy::*;

mod authenticator;
pub use authenticator::*;

mod accounts;
pub use accounts::*;
