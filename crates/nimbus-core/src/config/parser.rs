//! TOML parser with helpful error messages

use std::path::Path;

use super::schema::ProjectConfiguration;
use crate::error::{DeployError, Result};

/// Parse nimbus.toml with detailed error messages
pub fn parse_project_toml(path: &Path) -> Result<ProjectConfiguration> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DeployError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;

    parse_project_toml_str(&content)
}

/// Parse nimbus.toml content from string
pub fn parse_project_toml_str(content: &str) -> Result<ProjectConfiguration> {
    let mut config: ProjectConfiguration =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    for (name, environment) in config.environments.iter_mut() {
        environment.name = name.clone();
    }

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with line context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> DeployError {
    let message = error.message().to_string();

    match error.span() {
        Some(span) => {
            let prefix = content.get(..span.start).unwrap_or(content);
            let line_num = prefix.matches('\n').count() + 1;
            DeployError::Config(format!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            ))
        }
        None => DeployError::Config(format!("TOML parsing error: {}", message)),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let end = (line_num + 2).min(lines.len());
    let start = line_num.saturating_sub(2).min(end);

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::ProjectType;
    use crate::types::{Architecture, DeploymentType};

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
id = 42
name = "storefront"
type = "node"

[environments.production]
deployment_type = "image"
architecture = "arm64"
build = ["npm ci", "npm run build"]
include = ["tests/fixtures/**"]

[environments.staging]
build = ["npm ci"]
"#;

        let config = parse_project_toml_str(toml).unwrap();
        assert_eq!(config.id, 42);
        assert_eq!(config.project_type, ProjectType::Node);
        assert_eq!(config.environments.len(), 2);

        let production = config.environment("production").unwrap();
        assert_eq!(production.name, "production");
        assert_eq!(production.deployment_type().unwrap(), DeploymentType::Image);
        assert_eq!(production.architecture, Architecture::Arm64);
        assert_eq!(production.build.len(), 2);

        let staging = config.environment("staging").unwrap();
        assert_eq!(staging.deployment_type().unwrap(), DeploymentType::Zip);
        assert_eq!(staging.architecture, Architecture::X86_64);
    }

    #[test]
    fn test_unknown_environment_lists_known_ones() {
        let config = parse_project_toml_str(
            "id = 1\nname = \"app\"\n[environments.production]\n",
        )
        .unwrap();
        let err = config.environment("qa").unwrap_err();
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_unknown_deployment_type_is_rejected() {
        let toml = r#"
id = 1
name = "app"
[environments.production]
deployment_type = "lambda"
"#;
        let err = parse_project_toml_str(toml).unwrap_err();
        assert!(matches!(err, DeployError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let toml = r#"
id = 1
name = "app"
[environments.production]
ignore = ["src/[oops"]
"#;
        let err = parse_project_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("src/[oops"));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let toml = "id = 1\nname = \"app\"\n[environments.production\n";
        let err = parse_project_toml_str(toml).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(err.to_string().contains("TOML parsing error"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = parse_project_toml_str("id = 1\nname = \" \"\n").unwrap_err();
        assert!(err.to_string().contains("project name"));
    }
}
