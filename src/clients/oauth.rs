use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::time::Duration;

use crate::config::{AuthConfig, OAuthProviderConfig};
use crate::db::NewUser;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    GitHub,
}

impl Provider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::GitHub => "github",
        }
    }
}

pub struct OAuthClient {
    client: reqwest::Client,
    google: Option<OAuthProviderConfig>,
    github: Option<OAuthProviderConfig>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl OAuthClient {
    #[must_use]
    pub fn new(auth: &AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("lacquer/0.1")
            .build()
            .unwrap_or_default();

        Self {
            client,
            google: auth.google.clone(),
            github: auth.github.clone(),
        }
    }

    fn provider_config(&self, provider: Provider) -> Result<&OAuthProviderConfig> {
        let config = match provider {
            Provider::Google => self.google.as_ref(),
            Provider::GitHub => self.github.as_ref(),
        };
        config.ok_or_else(|| anyhow!("{} OAuth is not configured", provider.as_str()))
    }

    #[must_use]
    pub const fn is_configured(&self, provider: Provider) -> bool {
        match provider {
            Provider::Google => self.google.is_some(),
            Provider::GitHub => self.github.is_some(),
        }
    }

    /// Browser URL that starts the authorization-code flow.
    pub fn authorize_url(&self, provider: Provider, redirect_uri: &str) -> Result<String> {
        let config = self.provider_config(provider)?;
        let client_id = urlencoding::encode(&config.client_id);
        let redirect = urlencoding::encode(redirect_uri);

        let url = match provider {
            Provider::Google => format!(
                "{GOOGLE_AUTH_URL}?client_id={client_id}&redirect_uri={redirect}\
                 &response_type=code&scope=openid%20email%20profile"
            ),
            Provider::GitHub => format!(
                "{GITHUB_AUTH_URL}?client_id={client_id}&redirect_uri={redirect}\
                 &scope=read%3Auser%20user%3Aemail"
            ),
        };

        Ok(url)
    }

    /// Exchanges an authorization code for the provider profile.
    pub async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<NewUser> {
        match provider {
            Provider::Google => self.exchange_google(code, redirect_uri).await,
            Provider::GitHub => self.exchange_github(code, redirect_uri).await,
        }
    }

    async fn exchange_google(&self, code: &str, redirect_uri: &str) -> Result<NewUser> {
        let config = self.provider_config(Provider::Google)?;

        let token: TokenResponse = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", &config.client_id),
                ("client_secret", &config.client_secret),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()
            .context("Google token exchange failed")?
            .json()
            .await?;

        let info: GoogleUserInfo = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .context("Google userinfo request failed")?
            .json()
            .await?;

        Ok(NewUser {
            provider: Provider::Google.as_str().to_string(),
            provider_id: info.id,
            name: info.name.unwrap_or_else(|| info.email.clone()),
            email: info.email,
            avatar_url: info.picture,
        })
    }

    async fn exchange_github(&self, code: &str, redirect_uri: &str) -> Result<NewUser> {
        let config = self.provider_config(Provider::GitHub)?;

        let token: TokenResponse = self
            .client
            .post(GITHUB_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("code", code),
                ("client_id", &config.client_id),
                ("client_secret", &config.client_secret),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?
            .error_for_status()
            .context("GitHub token exchange failed")?
            .json()
            .await?;

        let user: GithubUser = self
            .client
            .get(GITHUB_USER_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .context("GitHub user request failed")?
            .json()
            .await?;

        // The profile email is often hidden; fall back to the primary
        // verified address from the emails endpoint.
        let email = match user.email {
            Some(email) => email,
            None => self.github_primary_email(&token.access_token).await?,
        };

        Ok(NewUser {
            provider: Provider::GitHub.as_str().to_string(),
            provider_id: user.id.to_string(),
            name: user.name.unwrap_or(user.login),
            email,
            avatar_url: user.avatar_url,
        })
    }

    async fn github_primary_email(&self, access_token: &str) -> Result<String> {
        let emails: Vec<GithubEmail> = self
            .client
            .get(GITHUB_EMAILS_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()
            .context("GitHub emails request failed")?
            .json()
            .await?;

        emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email)
            .ok_or_else(|| anyhow!("GitHub account has no verified primary email"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured_client() -> OAuthClient {
        let auth = AuthConfig {
            github: Some(OAuthProviderConfig {
                client_id: "gh-id".to_string(),
                client_secret: "gh-secret".to_string(),
            }),
            ..AuthConfig::default()
        };
        OAuthClient::new(&auth)
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let client = configured_client();
        let url = client
            .authorize_url(Provider::GitHub, "http://localhost:3001/api/auth/github/callback")
            .unwrap();
        assert!(url.starts_with(GITHUB_AUTH_URL));
        assert!(url.contains("client_id=gh-id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3001"));
    }

    #[test]
    fn test_unconfigured_provider_errors() {
        let client = configured_client();
        assert!(!client.is_configured(Provider::Google));
        assert!(client.authorize_url(Provider::Google, "http://x").is_err());
    }
}
