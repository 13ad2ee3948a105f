pub mod changelog;
pub mod chat;
pub mod diagnostics;
pub mod doc;
pub mod error;
pub mod health;
pub mod messages;
pub mod user;

pub use changelog::*;
pub use chat::*;
pub use diagnostics::*;
pub use doc::*;
pub use error::*;
pub use health::*;
pub use messages::*;
pub use user::*;
