use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use zbxconf::compiler::{Compiler, DefaultRule, DefaultRules, EXPORT_VERSION};
use zbxconf::compiler::xml::DEFAULT_INDENT;

pub const CONFIG_FILE: &str = "zbxconf.toml";

/// Project context for zbxconf operations
pub struct ProjectContext {
    /// Path of the loaded config file, if one was found
    pub config_path: Option<PathBuf>,
    /// Loaded configuration, defaults when no file was found
    pub config: ZbxconfConfig,
}

/// Configuration stored in zbxconf.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZbxconfConfig {
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub rules: RuleSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub sender: SenderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            indent: default_indent(),
        }
    }
}

fn default_version() -> String {
    EXPORT_VERSION.to_string()
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Use only `extra`, dropping the standard table
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub extra: Vec<DefaultRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_api_user")]
    pub user: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            user: default_api_user(),
        }
    }
}

fn default_api_url() -> String {
    "${ZABBIX_URL}".to_string()
}

fn default_api_user() -> String {
    "Admin".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderSettings {
    #[serde(default = "default_sender_server")]
    pub server: String,
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            server: default_sender_server(),
        }
    }
}

fn default_sender_server() -> String {
    "127.0.0.1:10051".to_string()
}

/// Expand a whole-value `${VAR}` reference from the environment.
fn expand_env(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).with_context(|| format!("Environment variable {var_name} not set"))
    } else {
        Ok(value.to_string())
    }
}

impl ProjectContext {
    /// Load `explicit` when given, otherwise search the current directory and
    /// its ancestors for zbxconf.toml
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let current_dir = std::env::current_dir().context("Failed to get current directory")?;
                Self::find_from(&current_dir)
            }
        }
    }

    /// Find a config file starting from the given directory
    pub fn find_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
            if !current.pop() {
                return Ok(Self {
                    config_path: None,
                    config: ZbxconfConfig::default(),
                });
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ZbxconfConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config,
        })
    }

    /// The pruning rules in effect
    pub fn rules(&self) -> DefaultRules {
        let mut rules = if self.config.rules.replace {
            DefaultRules::new()
        } else {
            DefaultRules::standard()
        };
        rules.extend(self.config.rules.extra.iter().cloned());
        rules
    }

    /// A compiler configured from the export and rules sections
    pub fn compiler(&self) -> Compiler {
        Compiler::new()
            .with_rules(self.rules())
            .with_version(self.config.export.version.clone())
            .with_indent(self.config.export.indent)
    }

    /// Get the API URL, expanding environment variables
    pub fn api_url(&self) -> Result<String> {
        expand_env(&self.config.api.url)
    }

    pub fn sender_server(&self) -> Result<String> {
        expand_env(&self.config.sender.server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ZbxconfConfig::default();
        assert_eq!(config.export.version, "2.0");
        assert_eq!(config.export.indent, 2);
        assert!(!config.rules.replace);
        assert_eq!(config.api.url, "${ZABBIX_URL}");
        assert_eq!(config.sender.server, "127.0.0.1:10051");
    }

    #[test]
    fn test_config_serialization() {
        let config = ZbxconfConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serializes");
        assert!(toml_str.contains("version"));
        assert!(toml_str.contains("indent"));
    }

    #[test]
    fn test_load_from_ancestor() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE)).expect("create");
        writeln!(
            file,
            "[export]\nindent = 4\n\n[rules]\nreplace = true\n\n[[rules.extra]]\npath = \"item/history\"\nvalue = 90\n\n[api]\nurl = \"http://zabbix.local/api_jsonrpc.php\""
        )
        .expect("write");
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).expect("mkdir");

        let ctx = ProjectContext::find_from(&nested).expect("loads");
        assert!(ctx.config_path.is_some());
        assert_eq!(ctx.config.export.indent, 4);
        assert_eq!(ctx.config.export.version, "2.0");
        let rules = ctx.rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.iter().next().map(|rule| rule.path.as_str()), Some("item/history"));
        assert_eq!(ctx.api_url().expect("literal url"), "http://zabbix.local/api_jsonrpc.php");
    }

    #[test]
    fn test_extra_rules_extend_standard() {
        let ctx = ProjectContext {
            config_path: None,
            config: ZbxconfConfig {
                rules: RuleSettings {
                    replace: false,
                    extra: vec![DefaultRule::new("graph/width", 900)],
                },
                ..Default::default()
            },
        };
        assert_eq!(ctx.rules().len(), DefaultRules::standard().len() + 1);
    }
}
