pub mod credentials;
pub mod input;
pub mod logging;
pub mod snapshot;
