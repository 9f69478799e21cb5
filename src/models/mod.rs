pub mod account;
pub mod loaders;
pub mod proxy;
pub mod task;

pub use account::{AccessCredential, AccountProfile};
pub use loaders::{load_credentials, load_proxy_specs};
pub use proxy::{ProxyEndpoint, ProxyProtocol};
pub use task::{Task, TaskId, TaskStatus};
