pub mod config;
pub mod core_command;
pub mod core_dispatch;
pub mod core_enforce;
pub mod core_evict;
pub mod core_guard;
pub mod core_platform;
pub mod core_policy;
pub mod core_pool;
pub mod logging;

pub use config::WardenConfig;
pub use core_dispatch::{Engine, OperationDispatcher};
pub use core_platform::{Operation, PlatformClient};
pub use core_policy::{PolicyStore, SqlPolicyStore};
pub use core_pool::IdentityPool;
pub use logging::{init_logging, LogLevel};
