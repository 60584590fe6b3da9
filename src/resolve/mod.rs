pub mod stream_catalog;

pub use stream_catalog::StreamCatalog;
