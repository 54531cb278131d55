//! Player configuration from environment variables and command-line flags.
//!
//! Flags win over the environment. The API key is looked up last because the
//! variable it comes from depends on the chosen provider.

use std::path::PathBuf;
use std::str::FromStr;

use crate::model::provider::parse_model_override;
use crate::model::ProviderId;
use crate::runtime::ControllerSettings;
use crate::surface::Viewport;

pub const DEFAULT_GAME_URL: &str = "http://localhost:3000/";
pub const DEFAULT_MEMORY_DIR: &str = "./memory";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
    #[error("invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
    #[error("{0} requires a value")]
    MissingFlagValue(String),
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Values given on the command line. `None` falls back to the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub game_url: Option<String>,
    pub memory_dir: Option<PathBuf>,
    pub memory: Option<bool>,
    pub viewport: Option<String>,
    pub headless: Option<bool>,
    pub screenshot_dir: Option<PathBuf>,
    pub max_tool_rounds: Option<String>,
    pub keep_snapshots: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Help,
    Run(CliOverrides),
}

impl CliOverrides {
    /// Parses `--flag value` and `--flag=value` arguments, program name
    /// already stripped.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<CliCommand, ConfigError> {
        let mut overrides = CliOverrides::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => return Ok(CliCommand::Help),
                "--no-memory" => {
                    overrides.memory = Some(false);
                    continue;
                }
                "--headed" => {
                    overrides.headless = Some(false);
                    continue;
                }
                _ => {}
            }

            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let slot: &mut Option<String> = match flag.as_str() {
                "--provider" => &mut overrides.provider,
                "--model" => &mut overrides.model,
                "--base-url" => &mut overrides.base_url,
                "--url" => &mut overrides.game_url,
                "--viewport" => &mut overrides.viewport,
                "--max-tool-rounds" => &mut overrides.max_tool_rounds,
                "--keep-snapshots" => &mut overrides.keep_snapshots,
                "--memory-dir" | "--screenshot-dir" => {
                    let value = flag_value(&flag, inline, &mut args)?;
                    let path = Some(PathBuf::from(value));
                    if flag == "--memory-dir" {
                        overrides.memory_dir = path;
                    } else {
                        overrides.screenshot_dir = path;
                    }
                    continue;
                }
                _ => return Err(ConfigError::UnknownArgument(arg)),
            };
            *slot = Some(flag_value(&flag, inline, &mut args)?);
        }
        Ok(CliCommand::Run(overrides))
    }
}

fn flag_value(
    flag: &str,
    inline: Option<String>,
    args: &mut impl Iterator<Item = String>,
) -> Result<String, ConfigError> {
    inline
        .or_else(|| args.next())
        .ok_or_else(|| ConfigError::MissingFlagValue(flag.to_string()))
}

pub fn print_help() {
    println!("Tic-Tac-Toe playing agent");
    println!();
    println!("Usage:");
    println!("  tictactoe-agent [options]");
    println!();
    println!("Options:");
    println!("  --provider <openai|anthropic>  Model provider (env TTT_PROVIDER, default openai)");
    println!("  --model <name>                 Model, optionally <provider>/<model> (env <PROVIDER>_MODEL)");
    println!("  --base-url <url>               API base URL (env <PROVIDER>_BASE_URL)");
    println!("  --url <url>                    Game page (env TTT_GAME_URL, default {DEFAULT_GAME_URL})");
    println!("  --memory-dir <path>            Memory directory (env TTT_MEMORY_DIR, default {DEFAULT_MEMORY_DIR})");
    println!("  --no-memory                    Play without the memory tool (env TTT_MEMORY=off)");
    println!("  --viewport <WxH>               Browser viewport (env TTT_VIEWPORT, default 1200x900)");
    println!("  --headed                       Show the browser window (env TTT_HEADLESS=false)");
    println!("  --screenshot-dir <path>        Save every capture as PNG (env TTT_SCREENSHOT_DIR)");
    println!("  --max-tool-rounds <n>          Tool rounds per agent turn (env TTT_MAX_TOOL_ROUNDS, default 100)");
    println!("  --keep-snapshots <n|all>       Screenshots sent to the model (env TTT_KEEP_SNAPSHOTS, default 1)");
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub provider: ProviderId,
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub game_url: String,
    pub memory_dir: PathBuf,
    pub memory_enabled: bool,
    pub viewport: Viewport,
    pub headless: bool,
    pub screenshot_dir: Option<PathBuf>,
    pub controller: ControllerSettings,
}

impl PlayerConfig {
    pub fn from_env(overrides: &CliOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves the configuration, reading variables through `lookup`.
    /// Blank variables count as unset.
    pub fn resolve(
        overrides: &CliOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut provider = match overrides.provider.clone().or_else(|| env("TTT_PROVIDER")) {
            Some(value) => ProviderId::from_str(&value)
                .map_err(|reason| invalid("provider", &value, reason))?,
            None => ProviderId::OpenAi,
        };

        let model_override = overrides
            .model
            .clone()
            .or_else(|| env(&format!("{}_MODEL", provider.env_prefix())));
        let model = match model_override {
            Some(value) => {
                let (explicit, name) = parse_model_override(&value);
                if let Some(explicit) = explicit {
                    provider = explicit;
                }
                Some(name)
            }
            None => None,
        };

        let key_var = format!("{}_API_KEY", provider.env_prefix());
        let api_key = env(&key_var).ok_or(ConfigError::MissingApiKey(key_var))?;
        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env(&format!("{}_BASE_URL", provider.env_prefix())));

        let viewport = match overrides.viewport.clone().or_else(|| env("TTT_VIEWPORT")) {
            Some(value) => Viewport::parse(&value)
                .ok_or_else(|| invalid("viewport", &value, "expected WIDTHxHEIGHT".to_string()))?,
            None => Viewport::default(),
        };

        let memory_enabled = match overrides.memory {
            Some(enabled) => enabled,
            None => env("TTT_MEMORY")
                .map(|v| parse_switch("TTT_MEMORY", &v))
                .transpose()?
                .unwrap_or(true),
        };
        let headless = match overrides.headless {
            Some(headless) => headless,
            None => env("TTT_HEADLESS")
                .map(|v| parse_switch("TTT_HEADLESS", &v))
                .transpose()?
                .unwrap_or(true),
        };

        let mut controller = ControllerSettings::default();
        if let Some(value) = overrides
            .max_tool_rounds
            .clone()
            .or_else(|| env("TTT_MAX_TOOL_ROUNDS"))
        {
            controller.max_tool_rounds = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(invalid(
                        "max tool rounds",
                        &value,
                        "expected a positive integer".to_string(),
                    ))
                }
            };
        }
        if let Some(value) = overrides
            .keep_snapshots
            .clone()
            .or_else(|| env("TTT_KEEP_SNAPSHOTS"))
        {
            controller.keep_snapshots = match value.trim() {
                "all" => None,
                n => Some(n.parse::<usize>().map_err(|_| {
                    invalid("keep snapshots", &value, "expected a count or 'all'".to_string())
                })?),
            };
        }

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
            game_url: overrides
                .game_url
                .clone()
                .or_else(|| env("TTT_GAME_URL"))
                .unwrap_or_else(|| DEFAULT_GAME_URL.to_string()),
            memory_dir: overrides
                .memory_dir
                .clone()
                .or_else(|| env("TTT_MEMORY_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEMORY_DIR)),
            memory_enabled,
            viewport,
            headless,
            screenshot_dir: overrides
                .screenshot_dir
                .clone()
                .or_else(|| env("TTT_SCREENSHOT_DIR").map(PathBuf::from)),
            controller,
        })
    }
}

fn invalid(name: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn parse_switch(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "expected on or off".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn args(list: &[&str]) -> CliOverrides {
        match CliOverrides::parse(list.iter().map(|s| s.to_string())).expect("valid args") {
            CliCommand::Run(overrides) => overrides,
            CliCommand::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults_need_only_an_api_key() {
        let config =
            PlayerConfig::resolve(&CliOverrides::default(), lookup(&[("OPENAI_API_KEY", "sk")]))
                .expect("config");

        assert_eq!(config.provider, ProviderId::OpenAi);
        assert_eq!(config.api_key, "sk");
        assert_eq!(config.model, None);
        assert_eq!(config.game_url, DEFAULT_GAME_URL);
        assert_eq!(config.memory_dir, PathBuf::from("./memory"));
        assert!(config.memory_enabled);
        assert!(config.headless);
        assert_eq!(config.viewport, Viewport::new(1200, 900));
        assert_eq!(config.screenshot_dir, None);
        assert_eq!(config.controller, ControllerSettings::default());
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = PlayerConfig::resolve(
            &CliOverrides::default(),
            lookup(&[("TTT_PROVIDER", "anthropic"), ("OPENAI_API_KEY", "sk")]),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey("ANTHROPIC_API_KEY".to_string()));
    }

    #[test]
    fn environment_settings_are_read() {
        let config = PlayerConfig::resolve(
            &CliOverrides::default(),
            lookup(&[
                ("TTT_PROVIDER", "anthropic"),
                ("ANTHROPIC_API_KEY", "ak"),
                ("ANTHROPIC_MODEL", "claude-opus-4-1"),
                ("TTT_GAME_URL", "http://127.0.0.1:8080/"),
                ("TTT_MEMORY", "off"),
                ("TTT_HEADLESS", "false"),
                ("TTT_VIEWPORT", "1024x768"),
                ("TTT_MAX_TOOL_ROUNDS", "20"),
                ("TTT_KEEP_SNAPSHOTS", "all"),
                ("TTT_SCREENSHOT_DIR", "shots"),
            ]),
        )
        .expect("config");

        assert_eq!(config.provider, ProviderId::Anthropic);
        assert_eq!(config.model.as_deref(), Some("claude-opus-4-1"));
        assert_eq!(config.game_url, "http://127.0.0.1:8080/");
        assert!(!config.memory_enabled);
        assert!(!config.headless);
        assert_eq!(config.viewport, Viewport::new(1024, 768));
        assert_eq!(config.controller.max_tool_rounds, 20);
        assert_eq!(config.controller.keep_snapshots, None);
        assert_eq!(config.screenshot_dir, Some(PathBuf::from("shots")));
    }

    #[test]
    fn flags_override_environment() {
        let overrides = args(&[
            "--model=anthropic/claude-haiku-4-5",
            "--url",
            "http://localhost:5173/",
            "--no-memory",
            "--keep-snapshots",
            "3",
        ]);
        let config = PlayerConfig::resolve(
            &overrides,
            lookup(&[
                ("ANTHROPIC_API_KEY", "ak"),
                ("TTT_GAME_URL", "http://ignored/"),
                ("TTT_MEMORY", "on"),
            ]),
        )
        .expect("config");

        assert_eq!(config.provider, ProviderId::Anthropic);
        assert_eq!(config.model.as_deref(), Some("claude-haiku-4-5"));
        assert_eq!(config.game_url, "http://localhost:5173/");
        assert!(!config.memory_enabled);
        assert_eq!(config.controller.keep_snapshots, Some(3));
    }

    #[test]
    fn bad_values_are_rejected() {
        let vars = [("OPENAI_API_KEY", "sk"), ("TTT_VIEWPORT", "big")];
        assert!(matches!(
            PlayerConfig::resolve(&CliOverrides::default(), lookup(&vars)),
            Err(ConfigError::InvalidValue { .. })
        ));

        let vars = [("OPENAI_API_KEY", "sk"), ("TTT_MAX_TOOL_ROUNDS", "0")];
        assert!(PlayerConfig::resolve(&CliOverrides::default(), lookup(&vars)).is_err());

        let vars = [("OPENAI_API_KEY", "sk"), ("TTT_MEMORY", "maybe")];
        assert!(PlayerConfig::resolve(&CliOverrides::default(), lookup(&vars)).is_err());
    }

    #[test]
    fn cli_parsing_errors() {
        assert_eq!(
            CliOverrides::parse(vec!["--url".to_string()]),
            Err(ConfigError::MissingFlagValue("--url".to_string()))
        );
        assert_eq!(
            CliOverrides::parse(vec!["--fast".to_string()]),
            Err(ConfigError::UnknownArgument("--fast".to_string()))
        );
        assert_eq!(
            CliOverrides::parse(vec!["--url=x".to_string(), "-h".to_string()]),
            Ok(CliCommand::Help)
        );
    }

    #[test]
    fn path_flags_accept_both_forms() {
        let overrides = args(&["--memory-dir=/tmp/mem", "--screenshot-dir", "shots"]);
        assert_eq!(overrides.memory_dir, Some(PathBuf::from("/tmp/mem")));
        assert_eq!(overrides.screenshot_dir, Some(PathBuf::from("shots")));
    }
}
