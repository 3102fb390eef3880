//! IoT message hub protocol.
//!
//! Everything about talking to the hub that does not need a network:
//! request signing, credentials, endpoint URLs, message metadata and the
//! response wire format. The HTTP client lives in `iothub-client`.
//!
//! # Signing
//!
//! ```
//! use iothub_protocol::{Credentials, Endpoint, RequestUrlFactory};
//!
//! let creds: Credentials = "https://iot.example.com=hub1=key=secret=180".parse()?;
//! let url = RequestUrlFactory::new(&creds).build(Endpoint::Publish)?;
//! assert!(url.as_str().starts_with("https://iot.example.com/hub1/publish/?key=key&expiration="));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod credentials;
mod digest;
mod environment;
mod message;
mod metadata;
mod response;
mod sign;
mod time;
mod urls;

pub use credentials::{Credentials, CredentialsError, DEFAULT_EXPIRATION};
pub use digest::{format_hash_header, BLOB_TYPE, BLOB_TYPE_HEADER, HASH_HEADER};
pub use environment::{EnvironmentInfo, EnvironmentProvider, SystemEnvironment};
pub use message::{Coordinate, Message, OperationType, Payload, PayloadKind};
pub use metadata::{transliterate, Metadata};
pub use response::{FeedPage, PublishResponse};
pub use sign::{decode_signature, SignatureBuilder};
pub use time::{format_hub_timestamp, format_utc};
pub use urls::{Endpoint, FeedDirection, RequestUrlFactory, UrlBuildError};
