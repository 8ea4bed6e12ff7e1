// onugate-api: async transport and retry policy for the upstream OLT/ONU management API

pub mod client;
pub mod envelope;
pub mod error;
pub mod params;
pub mod retry;
pub mod transport;

pub use client::{Payload, RawResponse, UpstreamTransport};
pub use error::Error;
pub use params::Params;
pub use retry::{RATE_LIMIT_PHRASES, RetryPolicy, is_rate_limit_text};
pub use transport::{TlsMode, TransportConfig};

pub use reqwest::Method;
