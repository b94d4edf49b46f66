use std::time::Duration;

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    /// Firebase / Google Cloud project the tokens must be issued for.
    pub project_id: Option<String>,
    /// JWK set holding the provider's current signing keys.
    pub keys_url: String,
    pub timeout: Duration,
}
