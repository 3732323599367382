//! docdesk-client
//!
//! reqwest implementation of [`docdesk_core::traits::DocsBackend`] for the
//! document service JSON API, plus the tolerant decoders it uses.

pub mod decode;
pub mod http;

pub use http::HttpBackend;
