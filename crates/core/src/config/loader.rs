use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Environment variables use the `NICS_PROC_` prefix and `__` between
/// nested keys, e.g. `NICS_PROC_SMTP__PASSWORD`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("NICS_PROC_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[smtp]
host = "smtp.example.org"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.smtp.unwrap().host, "smtp.example.org");
        assert!(config.provisioner.is_none());
    }

    #[test]
    fn test_load_config_from_str_provisioner_missing_emapi() {
        let toml = r#"
[provisioner]
rooms = '{"rooms": []}'
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[provisioner]
rooms = '{{"rooms": [{{"roomName": "Working Map", "isSecure": false}}]}}'

[provisioner.emapi]
url = "http://localhost:8080/em-api/v1"
identity_user = "processor@example.org"
identity_org_id = 7
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");

        let provisioner = config.provisioner.unwrap();
        assert_eq!(provisioner.emapi.identity_org_id, 7);
        assert_eq!(provisioner.emapi.identity_header, "CUSTOM-uid");
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            load_config_from_str(include_str!("../../../../config.example.toml")).unwrap();
        crate::config::validate_config(&config).unwrap();

        let provisioner = config.provisioner.unwrap();
        let rooms = crate::provisioner::RoomsConfig::parse(&provisioner.rooms).unwrap();
        assert_eq!(rooms.rooms.len(), 2);
        assert!(rooms.rooms[1].is_secure);
        assert_eq!(provisioner.routing.escalation_marker, "incidentEscalation");
    }
}
