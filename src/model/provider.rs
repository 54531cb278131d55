//! Provider ID type and parsing utilities.

use std::fmt;
use std::str::FromStr;

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
    Anthropic,
}

impl ProviderId {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenAi, ProviderId::Anthropic]
    }

    /// Prefix of the `<PREFIX>_API_KEY`, `<PREFIX>_MODEL` and
    /// `<PREFIX>_BASE_URL` environment variables.
    pub const fn env_prefix(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OPENAI",
            ProviderId::Anthropic => "ANTHROPIC",
        }
    }

    pub const fn default_model(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "gpt-4.1",
            ProviderId::Anthropic => "claude-sonnet-4-5",
        }
    }

    pub const fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compat" => Ok(ProviderId::OpenAi),
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            _ => Err(format!("unknown provider: {}", s)),
        }
    }
}

impl serde::Serialize for ProviderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for ProviderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProviderId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a model override string in `<provider>/<model>` format.
/// Returns (provider_override, model_name) where provider_override is None if not specified.
pub fn parse_model_override(value: &str) -> (Option<ProviderId>, String) {
    let trimmed = value.trim();
    if let Some((provider_str, model)) = trimmed.split_once('/') {
        if let Ok(provider) = ProviderId::from_str(provider_str) {
            let model = model.trim().to_string();
            if !model.is_empty() {
                return (Some(provider), model);
            }
        }
    }
    (None, trimmed.to_string())
}
