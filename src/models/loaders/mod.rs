pub mod text_loader;

pub use text_loader::{load_credentials, load_proxy_specs};
