pub mod cached_hash_provider;
pub mod html_provider;

pub use cached_hash_provider::CachedHashProvider;
pub use html_provider::HtmlProvider;
