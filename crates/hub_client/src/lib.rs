//! IoT message hub client.
//!
//! This crate is the HTTP side of the hub contract: publish (small and
//! large), storage metadata, and the confirmed-message feed. Signing and
//! wire types come from `iothub-protocol` and are re-exported here.
//!
//! No retries. No caching. The only bound on a hung call is the request
//! timeout in [`ClientConfig`].

mod auth;
mod client;
mod config;
mod error;
mod feed;

pub use auth::{
    credentials_file_path, credentials_from_env, delete_credentials, load_credentials,
    load_credentials_from, save_credentials, save_default_credentials, CredentialsFile,
    CredentialsFileError, CREDENTIALS_ENV,
};
pub use client::{HubClient, CURSOR_HEADER};
pub use config::{ClientConfig, DEFAULT_TIMEOUT_SECS, USER_AGENT};
pub use error::{ErrorKind, HubError, TransportError};
pub use feed::FeedPager;

pub use iothub_protocol::{
    format_hash_header, Coordinate, Credentials, CredentialsError, EnvironmentInfo,
    EnvironmentProvider, FeedDirection, FeedPage, Message, Metadata, OperationType, Payload,
    PayloadKind, PublishResponse, SystemEnvironment,
};
