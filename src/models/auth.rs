use std::fmt;
use std::path::PathBuf;

/// SSH authentication method resolved from the configured credentials
#[derive(Clone, PartialEq)]
pub enum AuthMethod {
    /// Password authentication
    Password(String),
    /// Public key authentication
    PublicKey { private_key_path: PathBuf },
}

impl AuthMethod {
    pub fn public_key(path: impl Into<PathBuf>) -> Self {
        Self::PublicKey {
            private_key_path: path.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::PublicKey { .. } => "publickey",
        }
    }
}

// Never print the password, even in debug logs
impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(***)"),
            Self::PublicKey { private_key_path } => f
                .debug_struct("PublicKey")
                .field("private_key_path", private_key_path)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_password() {
        let auth = AuthMethod::Password("hunter2".to_string());
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(rendered, "Password(***)");
    }

    #[test]
    fn test_auth_method_label() {
        assert_eq!(AuthMethod::Password("x".into()).label(), "password");
        assert_eq!(AuthMethod::public_key("/tmp/id").label(), "publickey");
    }
}
