use secrecy::SecretString;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Credential source for one provider
///
/// Either an inline value or an environment-variable indirection. A token
/// selects OAuth-style headers upstream; an API key selects the `x-api-key`
/// (Anthropic) or bearer (OpenAI) header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialConfig {
    /// Inline OAuth token
    pub token: Option<SecretString>,
    /// Inline API key
    pub api_key: Option<SecretString>,
    /// Environment variable holding the OAuth token
    pub token_env: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
}

/// Secret-bearing fields always serialize as `***`
///
/// The only serialized view of a credential is the `/config` endpoint, so
/// masking lives at the type level rather than in every call site.
impl Serialize for CredentialConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.token.is_some() {
            map.serialize_entry("token", "***")?;
        }
        if self.api_key.is_some() {
            map.serialize_entry("apiKey", "***")?;
        }
        if let Some(var) = &self.token_env {
            map.serialize_entry("tokenEnv", var)?;
        }
        if let Some(var) = &self.api_key_env {
            map.serialize_entry("apiKeyEnv", var)?;
        }
        map.end()
    }
}

/// Environment variable consulted when a provider has no `auth` entry
///
/// `ANTHROPIC_API_KEY` for the provider named `anthropic`, and so on.
pub fn default_key_env(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_ascii_uppercase().replace('-', "_"))
}
