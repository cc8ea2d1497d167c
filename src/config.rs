use crate::consts::{CLIENT_ID_ENV_VAR, CLIENT_SECRET_ENV_VAR, SCOPE_ENV_VAR, TENANT_ENV_VAR};
use std::fmt;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Could not get '{0}' from environment: variable is not set")]
    MissingEnv(&'static str),
    #[error("Could not get '{0}' from environment: variable is empty")]
    EmptyEnv(&'static str),
    #[error("Invalid Platform API hostname '{hostname}'")]
    Hostname {
        hostname: String,
        #[source]
        error: url::ParseError,
    },
    #[error("Invalid OAuth authority '{authority}'")]
    Authority {
        authority: String,
        #[source]
        error: url::ParseError,
    },
}

/// Environment lookup used by the binary.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// OAuth client credentials, loaded once and passed explicitly.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub tenant: String,
}

impl Credentials {
    /// Reads `CLIENT_ID`, `CLIENT_SECRET` and `SCOPE` through `lookup`,
    /// [`process_env`] outside of tests.
    pub fn from_lookup<F>(tenant: impl Into<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::MissingEnv(name))?;
            if value.is_empty() {
                return Err(ConfigError::EmptyEnv(name));
            }
            Ok(value)
        };

        let tenant = tenant.into();
        if tenant.is_empty() {
            return Err(ConfigError::EmptyEnv(TENANT_ENV_VAR));
        }

        Ok(Credentials {
            client_id: required(CLIENT_ID_ENV_VAR)?,
            client_secret: required(CLIENT_SECRET_ENV_VAR)?,
            scope: required(SCOPE_ENV_VAR)?,
            tenant,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("tenant", &self.tenant)
            .finish()
    }
}
