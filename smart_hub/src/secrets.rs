use smart_hub_core::Secrets;

// Read secrets directly from file at compile time
const SECRETS_TOML: &str = include_str!("../../secrets.toml");

/// Loads the secrets that were embedded at compile time.
pub fn load() -> anyhow::Result<Secrets> {
    Secrets::from_toml(SECRETS_TOML)
}
