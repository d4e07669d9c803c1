//! Plugin repository tooling
//!
//! Developer-facing utilities for talking to a remote plugin
//! repository. Only the credential boundary lives here; publishing
//! itself is a concern of external tooling.

pub mod credentials;

pub use credentials::{
    get_or_create_api_key, AccountRequest, Credentials, CredentialsError, PluginRepository, Profile,
};
