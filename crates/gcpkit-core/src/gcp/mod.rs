//! Google Cloud Secret Manager access
//!
//! - `SecretManagerClient`: blocking REST client, also usable as a `SecretSource`
//! - `TokenProvider` and implementations for obtaining OAuth access tokens

mod blocking;
mod client;
mod token;

pub use client::SecretManagerClient;
pub use token::{
    ChainTokenProvider, EnvTokenProvider, MetadataTokenProvider, StaticTokenProvider,
    TokenProvider,
};
