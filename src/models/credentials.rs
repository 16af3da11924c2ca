use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::enums::GrantType;

/// Secret half of the OAuth2 grant, chosen per deployment.
enum Grant {
    ClientCredentials {
        client_secret: Zeroizing<String>,
    },
    Password {
        username: String,
        password: Zeroizing<String>,
    },
}

/// Identity presented to the token endpoint. Immutable once built;
/// secrets are wiped from memory on drop.
pub struct Credentials {
    client_id: String,
    grant: Grant,
}

impl Credentials {
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            grant: Grant::ClientCredentials {
                client_secret: Zeroizing::new(client_secret.into()),
            },
        }
    }

    pub fn password(
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            grant: Grant::Password {
                username: username.into(),
                password: Zeroizing::new(password.into()),
            },
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn grant_type(&self) -> GrantType {
        match self.grant {
            Grant::ClientCredentials { .. } => GrantType::ClientCredentials,
            Grant::Password { .. } => GrantType::Password,
        }
    }

    /// Form fields for the token request body, in a fixed order.
    pub fn form_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![
            ("grant_type", self.grant_type().as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        match &self.grant {
            Grant::ClientCredentials { client_secret } => {
                params.push(("client_secret", client_secret.as_str()));
            }
            Grant::Password { username, password } => {
                params.push(("username", username.as_str()));
                params.push(("password", password.as_str()));
            }
        }
        params
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("grant_type", &self.grant_type())
            .finish_non_exhaustive()
    }
}

/// Bearer token for the clinical data service. Held in memory only.
#[derive(Clone)]
pub struct Token {
    access_token: Zeroizing<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: Zeroizing::new(access_token.into()),
            expires_at,
        }
    }

    pub fn bearer(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// A token without an expiry is treated as valid until the service says otherwise.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn client_credentials_form_fields() {
        let creds = Credentials::client_credentials("app-1", "s3cret");
        assert_eq!(creds.grant_type(), GrantType::ClientCredentials);
        assert_eq!(
            creds.form_params(),
            vec![
                ("grant_type", "client_credentials"),
                ("client_id", "app-1"),
                ("client_secret", "s3cret"),
            ]
        );
    }

    #[test]
    fn password_form_fields() {
        let creds = Credentials::password("app-1", "dr.who", "tardis");
        assert_eq!(creds.grant_type(), GrantType::Password);
        assert_eq!(
            creds.form_params(),
            vec![
                ("grant_type", "password"),
                ("client_id", "app-1"),
                ("username", "dr.who"),
                ("password", "tardis"),
            ]
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::client_credentials("app-1", "s3cret");
        let token = Token::new("abc.def.ghi", None);
        assert!(!format!("{creds:?}").contains("s3cret"));
        assert!(!format!("{token:?}").contains("abc.def.ghi"));
    }

    #[test]
    fn expiry_is_checked_against_instant() {
        let now = Utc::now();
        let token = Token::new("t", Some(now + Duration::seconds(60)));
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::seconds(60)));
        assert!(!Token::new("t", None).is_expired_at(now));
    }
}
