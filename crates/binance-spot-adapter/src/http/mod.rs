/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod account;
pub mod client;
pub mod clock;
pub mod error;
pub mod public;
pub mod signature;
pub mod trade;

pub use error::{BinanceError, ExchangeErrorBody, Result};
pub use signature::{RequestSigner, canonicalize, sign};

pub use client::{ClientConfig, Credentials, RequestSpec, SpotClient};
pub use clock::ClockSync;
pub use public::KLINES_LIMIT_CAP;
