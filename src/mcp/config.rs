use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::McpError;

/// Tool server configuration file.
///
/// ```json
/// {
///   "mcpServers": {
///     "slack": {
///       "command": "npx",
///       "args": ["-y", "slack-mcp-server"],
///       "env": { "SLACK_MCP_XOXP_TOKEN": "xoxp-..." }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers")]
    pub servers: BTreeMap<String, ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, McpError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(McpError::ConfigNotFound(path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, McpError> {
        let config: McpConfig =
            serde_json::from_str(raw).map_err(|e| McpError::InvalidConfig(e.to_string()))?;

        if config.servers.is_empty() {
            return Err(McpError::InvalidConfig(
                "no servers defined under 'mcpServers'".to_string(),
            ));
        }

        if let Some((name, _)) = config
            .servers
            .iter()
            .find(|(_, server)| server.command.trim().is_empty())
        {
            return Err(McpError::InvalidConfig(format!(
                "server '{}' has an empty command",
                name
            )));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let config = McpConfig::from_json(
            r#"{"mcpServers": {"slack": {
                "command": "npx",
                "args": ["-y", "slack-mcp-server"],
                "env": {"TOKEN": "x"}
            }}}"#,
        )
        .unwrap();

        let slack = &config.servers["slack"];
        assert_eq!(slack.command, "npx");
        assert_eq!(slack.args, vec!["-y", "slack-mcp-server"]);
        assert_eq!(slack.env["TOKEN"], "x");
    }

    #[test]
    fn test_optional_fields_default() {
        let config = McpConfig::from_json(r#"{"mcpServers": {"local": {"command": "./server"}}}"#)
            .unwrap();
        assert!(config.servers["local"].args.is_empty());
        assert!(config.servers["local"].env.is_empty());
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            McpConfig::from_json("{"),
            Err(McpError::InvalidConfig(_))
        ));
        assert!(matches!(
            McpConfig::from_json(r#"{"mcpServers": {}}"#),
            Err(McpError::InvalidConfig(_))
        ));
        assert!(matches!(
            McpConfig::from_json(r#"{"mcpServers": {"x": {"command": " "}}}"#),
            Err(McpError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = McpConfig::from_file("/definitely/not/here/mcp.json");
        assert!(matches!(result, Err(McpError::ConfigNotFound(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mcpServers": {{"slack": {{"command": "npx"}}}}}}"#).unwrap();

        let config = McpConfig::from_file(file.path()).unwrap();
        assert_eq!(config.servers.len(), 1);
    }
}
