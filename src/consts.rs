use const_format::concatcp;
use std::time::Duration;

pub const CLIENT_ID_ENV_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_ENV_VAR: &str = "CLIENT_SECRET";
pub const SCOPE_ENV_VAR: &str = "SCOPE";

pub const TENANT_ENV_VAR: &str = "PLATFORM_API_TENANT";
pub const HOSTNAME_ENV_VAR: &str = "PLATFORM_API_HOSTNAME";
pub const CLUSTER_ENV_VAR: &str = "PLATFORM_API_CLUSTER";

pub const AUTHORITY_ENV_VAR: &str = "PLATFORM_API_AUTHORITY";
pub const AUTHORITY_DEFAULT_URL: &str = "https://login.microsoftonline.com";

pub const TOKEN_ENDPOINT_SUFFIX: &str = "/oauth2/v2.0/token";
pub const NAMESPACE_ENDPOINT: &str = "/namespace";

pub const GRANT_TYPE: &str = "client_credentials";
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

pub const DEFAULT_TTL: &str = "24h";
pub const DEFAULT_SERVICE_PRINCIPAL: &str = "default";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

pub const USER_AGENT: &str = concatcp!(PKG_NAME, "/", PKG_VERSION);

pub const DEFAULT_LOG_FILTER: &str = concatcp!(PKG_NAME, "=warn");
