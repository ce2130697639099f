use super::ConnectionConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Fingerprint over the connection-relevant configuration fields.
///
/// Fields are sorted by name before hashing, so the order they are supplied
/// in never changes the result.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConfigDigest([u8; 32]);

impl ConfigDigest {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sorted: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut hasher = Sha256::new();
        for (name, value) in &sorted {
            // Length prefixes keep ("ab", "c") distinct from ("a", "bc")
            hasher.update((name.len() as u64).to_le_bytes());
            hasher.update(name.as_bytes());
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }

        Self(hasher.finalize().into())
    }

    pub fn of(config: &ConnectionConfig) -> Self {
        Self::from_fields([
            ("host", config.host.clone()),
            ("port", config.port.to_string()),
            ("username", config.username.clone()),
            ("password", config.password.clone().unwrap_or_default()),
            (
                "key_path",
                config
                    .key_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        ])
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(self.0))
    }
}

impl fmt::Debug for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigDigest({})", self)
    }
}
