//! Credentials handed to deploy tooling.

use super::{DeployKey, FleetDomainError, ServerName};
use minijinja::{Environment, context};
use serde::Serialize;

const AUTHORIZED_KEYS_TEMPLATE: &str = "\
# deploy keys for {{ server }}
{% for key in keys %}
{% if key.title %}
# {{ key.title }}
{% endif %}
{{ key.material }}
{% endfor %}
";

/// Public material deploy tooling needs to reach a server.
///
/// The server's private key is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCredentials {
    server_name: ServerName,
    server_public_key: String,
    deploy_keys: Vec<DeployKey>,
}

#[derive(Serialize)]
struct AuthorizedKeyLine<'a> {
    title: Option<&'a str>,
    material: &'a str,
}

impl AccessCredentials {
    /// Bundles a server's public key with its authorised deploy keys.
    #[must_use]
    pub const fn new(
        server_name: ServerName,
        server_public_key: String,
        deploy_keys: Vec<DeployKey>,
    ) -> Self {
        Self {
            server_name,
            server_public_key,
            deploy_keys,
        }
    }

    /// Returns the server name.
    #[must_use]
    pub const fn server_name(&self) -> &ServerName {
        &self.server_name
    }

    /// Returns the server's generated public key.
    #[must_use]
    pub fn server_public_key(&self) -> &str {
        &self.server_public_key
    }

    /// Returns the deploy keys authorised for the server.
    #[must_use]
    pub fn deploy_keys(&self) -> &[DeployKey] {
        &self.deploy_keys
    }

    /// Renders the deploy keys as an `authorized_keys` document.
    ///
    /// Each key occupies one line, preceded by a `# title` comment line when
    /// the key has a title.
    ///
    /// # Errors
    ///
    /// Returns [`FleetDomainError::AuthorizedKeysRender`] when template
    /// rendering fails.
    pub fn render_authorized_keys(&self) -> Result<String, FleetDomainError> {
        let mut environment = Environment::new();
        environment.set_trim_blocks(true);

        let keys: Vec<AuthorizedKeyLine<'_>> = self
            .deploy_keys
            .iter()
            .map(|key| AuthorizedKeyLine {
                title: key.title(),
                material: key.key_material(),
            })
            .collect();

        environment
            .render_str(
                AUTHORIZED_KEYS_TEMPLATE,
                context! { server => self.server_name.as_str(), keys => keys },
            )
            .map_err(|error| FleetDomainError::AuthorizedKeysRender(error.to_string()))
    }
}
