pub mod bootstrap;
pub mod push;
pub mod store;

pub use bootstrap::{ensure_admin, BootstrapError};
pub use push::{LogPushSender, PushError, PushSender};
pub use store::Stores;
