pub mod changelog;
pub mod presence;
pub mod registry;
pub mod relay;

pub use relay::{Relay, RelayError, RelayHandle, RelaySettings, RelayStats};
