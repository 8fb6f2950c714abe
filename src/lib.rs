pub mod allowlist;
pub mod credentials;
pub mod env;
mod error;
pub mod gcs;
pub mod progress;

pub use error::{Error, Result};

/// The OAuth scopes a command needs
pub trait Scopes {
    fn scopes(&self) -> &'static [&'static str];
}
