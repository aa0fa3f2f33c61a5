/// Network adapters: HTTP transport and the disk-backed content cache
mod content_cache;
mod reqwest_transport;

pub use content_cache::ContentCache;
pub use reqwest_transport::ReqwestTransport;
