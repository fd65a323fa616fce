// mastertherm-api: Async Rust client for the MasterTherm heat-pump cloud service

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{LoginOutcome, SessionToken, hash_password};
pub use client::{MasterthermClient, SESSION_EXPIRED_ERROR_ID, WriteRequest};
pub use error::Error;
pub use models::{DataResponse, ErrorInfo, LoginResponse, ModuleInfo};
pub use transport::{TlsMode, TransportConfig};

/// Public endpoint of the MasterTherm cloud service.
pub const DEFAULT_BASE_URL: &str = "https://mastertherm.vip-it.cz";

/// Config-file key the service nests point data under.
pub const DEFAULT_CONFIG_FILE: &str = "varfile_mt1_config1";

/// Unit key below the config file.
pub const DEFAULT_UNIT: &str = "001";
