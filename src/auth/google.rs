use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by a verified third-party ID token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("identity provider rejected the token: {0}")]
    Rejected(String),

    #[error("token audience {0} does not match")]
    AudienceMismatch(String),

    #[error("token issuer {0} is not trusted")]
    UntrustedIssuer(String),

    #[error("token carries no email")]
    MissingEmail,

    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str, audience: &str) -> Result<VerifiedIdentity, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: Option<String>,
    iss: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

/// Checks Google ID tokens against the public tokeninfo endpoint.
pub struct GoogleIdTokenVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleIdTokenVerifier {
    pub fn new() -> Self {
        Self::with_endpoint(TOKENINFO_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for GoogleIdTokenVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str, audience: &str) -> Result<VerifiedIdentity, VerifyError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VerifyError::Rejected(response.status().to_string()));
        }

        let info: TokenInfo = response.json().await?;
        check_token_info(info, audience)
    }
}

fn check_token_info(info: TokenInfo, audience: &str) -> Result<VerifiedIdentity, VerifyError> {
    let aud = info.aud.unwrap_or_default();
    if aud != audience {
        return Err(VerifyError::AudienceMismatch(aud));
    }

    let iss = info.iss.unwrap_or_default();
    if !GOOGLE_ISSUERS.contains(&iss.as_str()) {
        return Err(VerifyError::UntrustedIssuer(iss));
    }

    let email = info
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or(VerifyError::MissingEmail)?;

    Ok(VerifiedIdentity {
        email,
        name: info.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(aud: &str, iss: &str, email: Option<&str>) -> TokenInfo {
        TokenInfo {
            aud: Some(aud.to_string()),
            iss: Some(iss.to_string()),
            email: email.map(str::to_string),
            name: Some("  ".to_string()),
        }
    }

    #[test]
    fn accepts_matching_audience_and_issuer() {
        let identity = check_token_info(info("client-1", "https://accounts.google.com", Some("a@b.mx")), "client-1").unwrap();
        assert_eq!(identity.email, "a@b.mx");
        assert_eq!(identity.name, None);
    }

    #[test]
    fn rejects_foreign_audience() {
        let err = check_token_info(info("client-2", "accounts.google.com", Some("a@b.mx")), "client-1").unwrap_err();
        assert!(matches!(err, VerifyError::AudienceMismatch(_)));
    }

    #[test]
    fn rejects_untrusted_issuer() {
        let err = check_token_info(info("client-1", "evil.example", Some("a@b.mx")), "client-1").unwrap_err();
        assert!(matches!(err, VerifyError::UntrustedIssuer(_)));
    }

    #[test]
    fn requires_email() {
        let err = check_token_info(info("client-1", "accounts.google.com", Some(" ")), "client-1").unwrap_err();
        assert!(matches!(err, VerifyError::MissingEmail));
    }
}
