//! Login handshake and the authenticated session.
//!
//! The site uses a classic form login guarded by a rotating anti-forgery token:
//! the token is read from the landing page's `<meta name="csrf-token">`, posted
//! back with the credentials, and the resulting cookie jar is what makes every
//! later request authenticated.

use crate::credentials::Credentials;
use crate::error::{Result, SessionError};
use crate::source::PageSource;
use klaval_core::{SessionConfig, SiteConfig};
use reqwest::{Client, Response, StatusCode};
use scraper::{Html, Selector};
use tracing::{debug, error, info, warn};
use url::Url;

/// Login endpoint, relative to the site origin.
const SIGN_IN_PATH: &str = "racers/sign_in";

/// Parse a base URL and make sure relative joins keep its path.
///
/// # Errors
/// Returns `SessionError::InvalidUrl` if `base` is not an absolute http(s) URL.
pub fn normalize_base_url(base: &str) -> Result<Url> {
    let mut url =
        Url::parse(base.trim()).map_err(|e| SessionError::InvalidUrl(format!("{base}: {e}")))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SessionError::InvalidUrl(format!(
            "{base}: expected an absolute http(s) URL"
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Read the anti-forgery token from a rendered page.
#[must_use]
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
}

/// Whether `html` contains markup only rendered for a logged-in racer.
fn has_authenticated_marker(html: &str, marker: &str) -> Result<bool> {
    let selector = parse_marker(marker)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().is_some())
}

fn parse_marker(marker: &str) -> Result<Selector> {
    Selector::parse(marker)
        .map_err(|e| SessionError::InvalidSelector(format!("authenticated marker '{marker}': {e}")))
}

/// Establishes authenticated sessions.
///
/// No retry is attempted here; callers decide whether to log in again.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    base_url: Url,
    config: SessionConfig,
}

impl SessionProvider {
    /// Create a provider for the configured site.
    ///
    /// # Errors
    /// Returns error if the base URL or the authenticated marker selector is invalid.
    pub fn new(site: &SiteConfig, config: &SessionConfig) -> Result<Self> {
        let base_url = normalize_base_url(&site.base_url)?;
        parse_marker(&config.authenticated_marker)?;

        Ok(Self {
            base_url,
            config: config.clone(),
        })
    }

    /// Site origin all page templates resolve against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform the login handshake.
    ///
    /// Fetches the landing page, extracts the anti-forgery token, submits the
    /// login form and probes the landing page again for authenticated-only
    /// markup.
    ///
    /// # Errors
    /// - `SessionError::Authentication` if the token is missing, the form is
    ///   rejected, or the probe shows an anonymous page
    /// - transport errors (`Http`, `Timeout`, `Status`) for network failures
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.request_timeout())
            .build()
            .map_err(|e| SessionError::transport(self.base_url.as_str(), e))?;

        let session = Session {
            client,
            base_url: self.base_url.clone(),
        };

        let landing = session.get(&self.base_url).await?;
        let token = extract_csrf_token(&landing).ok_or_else(|| {
            error!(url = %self.base_url, "anti-forgery token not found on landing page");
            SessionError::Authentication {
                reason: "anti-forgery token not found on landing page".to_string(),
            }
        })?;
        debug!("extracted anti-forgery token");

        let sign_in = self
            .base_url
            .join(SIGN_IN_PATH)
            .map_err(|e| SessionError::InvalidUrl(e.to_string()))?;
        let form = [
            ("authenticity_token", token.as_str()),
            ("racer[email]", credentials.username()),
            ("racer[password]", credentials.password()),
            ("racer[remember_me]", "0"),
            ("commit", "Sign In"),
        ];

        let response = session
            .client
            .post(sign_in.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| SessionError::transport(sign_in.as_str(), e))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            error!(status = status.as_u16(), "login form rejected");
            return Err(SessionError::Authentication {
                reason: format!("login rejected with HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(SessionError::Status {
                url: sign_in.to_string(),
                status: status.as_u16(),
            });
        }

        let probe = session.get(&self.base_url).await?;
        if !has_authenticated_marker(&probe, &self.config.authenticated_marker)? {
            error!(username = %credentials.username(), "login did not yield an authenticated session");
            return Err(SessionError::Authentication {
                reason: "authenticated markup not found after login".to_string(),
            });
        }

        info!(username = %credentials.username(), "logged in");
        Ok(session)
    }
}

/// An authenticated HTTP context.
///
/// Cheap to clone; clones share the cookie jar. The session does not serialise
/// concurrent requests, so one crawl should own one session.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
}

impl Session {
    /// Site origin this session is authenticated against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, url: &Url) -> Result<Response> {
        debug!(%url, "GET");
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SessionError::transport(url.as_str(), e))
    }

    async fn get(&self, url: &Url) -> Result<String> {
        let response = self.send(url).await?;
        read_body(url, response).await
    }

    /// Fetch a page that requires the login.
    ///
    /// A 401/403, or a redirect that ends on the sign-in page, means the site
    /// no longer accepts this session.
    async fn get_authenticated(&self, url: &Url) -> Result<String> {
        let response = self.send(url).await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!(%url, status = status.as_u16(), "session rejected");
            return Err(SessionError::Authentication {
                reason: format!("{url} answered HTTP {}", status.as_u16()),
            });
        }
        if is_sign_in_page(response.url()) {
            warn!(%url, "redirected to sign-in, session expired");
            return Err(SessionError::Authentication {
                reason: format!("{url} redirected to the sign-in page"),
            });
        }

        read_body(url, response).await
    }
}

async fn read_body(url: &Url, response: Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(SessionError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| SessionError::transport(url.as_str(), e))
}

fn is_sign_in_page(url: &Url) -> bool {
    url.path().trim_end_matches('/').ends_with(SIGN_IN_PATH)
}

#[async_trait::async_trait]
impl PageSource for Session {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        self.get_authenticated(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        let url = normalize_base_url("https://klavia.io").expect("valid base");
        assert_eq!(url.as_str(), "https://klavia.io/");
        assert_eq!(
            url.join(SIGN_IN_PATH).expect("join").as_str(),
            "https://klavia.io/racers/sign_in"
        );

        let nested = normalize_base_url("http://localhost:8080/mirror?x=1").expect("valid base");
        assert_eq!(nested.as_str(), "http://localhost:8080/mirror/");
    }

    #[test]
    fn test_normalize_base_url_invalid() {
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("mailto:racer@example.com").is_err());
    }

    #[test]
    fn test_extract_csrf_token() {
        let html = r#"
            <html><head>
                <meta name="csrf-param" content="authenticity_token">
                <meta name="csrf-token" content=" abc123== ">
            </head><body></body></html>
        "#;
        assert_eq!(extract_csrf_token(html), Some("abc123==".to_string()));
    }

    #[test]
    fn test_extract_csrf_token_missing() {
        assert_eq!(extract_csrf_token("<html><head></head></html>"), None);
        assert_eq!(
            extract_csrf_token(r#"<meta name="csrf-token" content="">"#),
            None
        );
    }

    #[test]
    fn test_is_sign_in_page() {
        let base = normalize_base_url("https://klavia.io").expect("valid base");
        assert!(is_sign_in_page(&base.join("racers/sign_in").expect("join")));
        assert!(is_sign_in_page(&base.join("racers/sign_in/").expect("join")));
        assert!(!is_sign_in_page(&base.join("teams/VYN").expect("join")));
        assert!(!is_sign_in_page(&base));
    }

    #[test]
    fn test_authenticated_marker() {
        let marker = SessionConfig::default().authenticated_marker;
        let signed_in = r#"<nav><a href="/racers/sign_out" data-turbo-method="delete">Sign out</a></nav>"#;
        let anonymous = r#"<nav><a href="/racers/sign_in">Sign in</a></nav>"#;

        assert!(has_authenticated_marker(signed_in, &marker).expect("valid marker"));
        assert!(!has_authenticated_marker(anonymous, &marker).expect("valid marker"));
    }

    #[test]
    fn test_provider_rejects_invalid_marker() {
        let config = SessionConfig {
            authenticated_marker: "a[".to_string(),
            ..SessionConfig::default()
        };
        let err = SessionProvider::new(&SiteConfig::default(), &config)
            .expect_err("selector is malformed");
        assert!(matches!(err, SessionError::InvalidSelector(_)));
    }
}
