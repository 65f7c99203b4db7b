pub mod http_client;
pub mod naming;

pub use http_client::StandardHttpClient;
pub use naming::{capitalize_first, derive_numeric_id, sprite_url};
