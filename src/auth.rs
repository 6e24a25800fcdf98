//! Auth-domain keys, credential records, and secret wrappers.

pub mod credential;
pub mod key;
pub mod secret;

pub use credential::*;
pub use key::*;
pub use secret::*;
