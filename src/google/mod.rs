pub mod client;
pub mod oauth;

pub use client::{GoogleClient, ProviderError};
pub use oauth::{Authenticator, TokenSource};
