use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

use crate::constants::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub const ALL: [OAuthProvider; 2] = [OAuthProvider::Google, OAuthProvider::Github];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }

    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            OAuthProvider::Google => paths::OAUTH_LOGIN_GOOGLE,
            OAuthProvider::Github => paths::OAUTH_LOGIN_GITHUB,
        }
    }

    /// Backend URL that starts the provider redirect dance.
    #[must_use]
    pub fn authorize_url(self, api_url: &str) -> String {
        format!("{}{}", api_url.trim_end_matches('/'), self.login_path())
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown oauth provider: {}", self.0)
    }
}

impl std::error::Error for UnknownProvider {}

impl FromStr for OAuthProvider {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OAuthProvider::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownProvider(value.to_string()))
    }
}

/// Post-login destination encoded in an OAuth return URL.
///
/// Accepts a full URL, a path with a query, or a bare query string. An
/// absent or empty `next`, or one pointing off-site, resolves to `/`.
#[must_use]
pub fn next_destination(return_url: &str) -> String {
    let without_fragment = return_url.split('#').next().unwrap_or_default();
    let query = match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.contains('=') && !without_fragment.contains("://") => {
            without_fragment
        }
        None => "",
    };
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
        .filter(|next| is_local_path(next))
        .unwrap_or_else(|| paths::APP_ROOT.to_string())
}

fn is_local_path(candidate: &str) -> bool {
    candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.starts_with("/\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_urls() {
        assert_eq!(
            OAuthProvider::Google.authorize_url("http://localhost:8081/"),
            "http://localhost:8081/oauth/login/google"
        );
        assert_eq!(
            OAuthProvider::Github.authorize_url("https://api.example.com"),
            "https://api.example.com/oauth/login/github"
        );
    }

    #[test]
    fn provider_parse() {
        assert_eq!("GitHub".parse::<OAuthProvider>(), Ok(OAuthProvider::Github));
        assert_eq!("google".parse::<OAuthProvider>(), Ok(OAuthProvider::Google));
        assert!("gitlab".parse::<OAuthProvider>().is_err());
    }

    #[test]
    fn next_from_full_url() {
        assert_eq!(
            next_destination("https://app.example.com/oauth/callback?next=%2Fdashboard"),
            "/dashboard"
        );
    }

    #[test]
    fn next_from_path_and_bare_query() {
        assert_eq!(
            next_destination("/oauth/callback?code=x&next=/notes%3Ftab%3D2"),
            "/notes?tab=2"
        );
        assert_eq!(next_destination("?next=/workshops"), "/workshops");
        assert_eq!(next_destination("next=/workshops"), "/workshops");
    }

    #[test]
    fn next_defaults_to_root() {
        assert_eq!(next_destination("/oauth/callback"), "/");
        assert_eq!(next_destination("/oauth/callback?next="), "/");
        assert_eq!(next_destination("https://app.example.com/cb"), "/");
        assert_eq!(next_destination(""), "/");
    }

    #[test]
    fn next_rejects_offsite_targets() {
        assert_eq!(next_destination("/cb?next=https://evil.example"), "/");
        assert_eq!(next_destination("/cb?next=//evil.example"), "/");
        assert_eq!(next_destination("/cb?next=/%5Cevil.example"), "/");
    }

    #[test]
    fn fragment_is_ignored() {
        assert_eq!(next_destination("/cb?next=/dashboard#top"), "/dashboard");
    }
}
