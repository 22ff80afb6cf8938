use super::{types::Config, ConfigError};
use crate::provisioner::RoomsConfig;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - SMTP host is set, and credentials exist when auth is enabled
/// - em-api url and identity user are set
/// - Rooms document parses
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(smtp) = &config.smtp {
        if smtp.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "smtp.host cannot be empty".to_string(),
            ));
        }
        if smtp.auth && smtp.username.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::ValidationError(
                "smtp.username is required when smtp.auth is enabled".to_string(),
            ));
        }
    }

    if let Some(provisioner) = &config.provisioner {
        if provisioner.emapi.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provisioner.emapi.url cannot be empty".to_string(),
            ));
        }
        if provisioner.emapi.identity_user.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provisioner.emapi.identity_user cannot be empty".to_string(),
            ));
        }
        RoomsConfig::parse(&provisioner.rooms).map_err(|e| {
            ConfigError::ValidationError(format!("provisioner.rooms is invalid: {}", e))
        })?;
    }

    Ok(())
}
