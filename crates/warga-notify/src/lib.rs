mod errors;
pub use errors::*;

mod template;
pub use template::*;

mod phone;
pub use phone::*;

mod dispatch;
pub use dispatch::*;

mod whatsapp;
pub use whatsapp::*;
