pub mod http;
pub mod proxy_resolver;

pub use http::{build_client, build_direct_client};
pub use proxy_resolver::{mask_proxy_spec, ProxyResolver};
