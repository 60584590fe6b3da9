pub mod resolved_url_cache;
pub mod url_cache;

pub use resolved_url_cache::ResolvedUrlCache;
pub use url_cache::UrlCache;
