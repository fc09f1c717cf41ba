//! RSA key provisioning backed by the `rsa` crate.

use crate::fleet::{
    domain::ServerKeypair,
    ports::{KeyProvisionError, KeyProvisioner, KeyProvisioningConfig},
};
use rand_core::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use ssh_key::{PublicKey, public::KeyData};

/// Smallest modulus accepted, in bits.
const MIN_KEY_BITS: usize = 1024;

/// Largest modulus accepted, in bits.
const MAX_KEY_BITS: usize = 8192;

/// Generates RSA keypairs for SSH access to a server.
///
/// The private half is PKCS#8 PEM with LF line endings. The public half is a
/// single OpenSSH line (`ssh-rsa AAAA...`) ready for `authorized_keys`.
#[derive(Debug, Clone, Default)]
pub struct RsaKeyProvisioner {
    config: KeyProvisioningConfig,
}

impl RsaKeyProvisioner {
    /// Creates a provisioner with the default 2048-bit key size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provisioner with a custom configuration.
    #[must_use]
    pub const fn with_config(config: KeyProvisioningConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &KeyProvisioningConfig {
        &self.config
    }
}

impl KeyProvisioner for RsaKeyProvisioner {
    fn generate(&self) -> Result<ServerKeypair, KeyProvisionError> {
        let bits = self.config.key_bits;
        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
            return Err(KeyProvisionError::UnsupportedKeySize(bits));
        }

        let private_key =
            RsaPrivateKey::new(&mut OsRng, bits).map_err(KeyProvisionError::generation)?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(KeyProvisionError::encoding)?
            .to_string();
        let ssh_public = ssh_key::public::RsaPublicKey::try_from(&public_key)
            .map_err(KeyProvisionError::encoding)?;
        let public_line = PublicKey::new(KeyData::Rsa(ssh_public), "")
            .to_openssh()
            .map_err(KeyProvisionError::encoding)?;

        ServerKeypair::new(public_line, private_pem)
            .map_err(|err| KeyProvisionError::InvalidKeypair(err.to_string()))
    }
}
