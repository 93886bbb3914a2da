//! Browser-emulating HTTP session.
//!
//! The booking site sits behind an automated-traffic check that wants
//! browser-looking headers and the cookies handed out on the landing page.
//! A [`BrowserSession`] fetches the landing page once on construction and
//! then reuses the resulting cookie jar for every later request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use tracing::{debug, info};

use super::error::KaiError;

/// Default base URL for the booking site.
pub const DEFAULT_BASE_URL: &str = "https://booking.kai.id";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Desktop Chrome on Windows.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Maximum redirects followed when following is enabled.
const MAX_REDIRECTS: usize = 10;

/// Configuration for talking to the booking site.
#[derive(Debug, Clone)]
pub struct KaiConfig {
    /// Base URL of the booking site, without trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl KaiConfig {
    /// Create a config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for KaiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// A response as seen by the session: where it ended up, its status, its body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after any redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP session that looks like a desktop browser to the booking site.
///
/// Two transports share one cookie jar: one follows redirects, one does
/// not, so callers can choose per request. `reqwest::Client` is internally
/// synchronised, so a session may be shared, but the cookie state is then
/// shared too. [`crate::schedule::ScheduleService`] opens one session per
/// search instead.
#[derive(Debug, Clone)]
pub struct BrowserSession {
    following: reqwest::Client,
    direct: reqwest::Client,
    jar: Arc<Jar>,
    config: KaiConfig,
}

impl BrowserSession {
    /// Build the transports and perform the warm-up request.
    ///
    /// Fails if the landing page cannot be fetched within the timeout.
    pub async fn connect(config: KaiConfig) -> Result<Self, KaiError> {
        let jar = Arc::new(Jar::default());

        let following = build_client(&jar, Policy::limited(MAX_REDIRECTS))?;
        let direct = build_client(&jar, Policy::none())?;

        let session = Self {
            following,
            direct,
            jar,
            config,
        };

        info!(base_url = %session.config.base_url, "initialising session and collecting cookies");
        let landing = session
            .get(&session.config.base_url, &[], true, session.config.timeout())
            .await?;
        if !landing.is_success() {
            return Err(KaiError::UpstreamStatus {
                status: landing.status,
                url: landing.url,
            });
        }
        info!("session initialised");

        Ok(session)
    }

    /// Issue a GET with query parameters.
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        allow_redirects: bool,
        timeout: Duration,
    ) -> Result<RawResponse, KaiError> {
        let client = if allow_redirects {
            &self.following
        } else {
            &self.direct
        };

        let mut request = client.get(url).timeout(timeout);
        if !params.is_empty() {
            request = request.query(params);
        }

        debug!(url, allow_redirects, "GET");
        read_response(request.send().await?).await
    }

    /// Issue an empty-bodied POST, following redirects.
    pub async fn post(&self, url: &str, timeout: Duration) -> Result<RawResponse, KaiError> {
        debug!(url, "POST");
        let response = self.following.post(url).timeout(timeout).send().await?;
        read_response(response).await
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &KaiConfig {
        &self.config
    }

    /// The cookie jar shared by both transports.
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.jar
    }
}

fn build_client(jar: &Arc<Jar>, policy: Policy) -> Result<reqwest::Client, KaiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7"),
    );

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .cookie_provider(Arc::clone(jar))
        .redirect(policy)
        .build()?;

    Ok(client)
}

async fn read_response(response: reqwest::Response) -> Result<RawResponse, KaiError> {
    let url = response.url().to_string();
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(RawResponse { url, status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn config_defaults() {
        let config = KaiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn config_strips_trailing_slash() {
        let config = KaiConfig::new("http://localhost:8080/").with_timeout(5);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn warm_up_collects_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header_exists("user-agent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "cf_clearance=abc; Path=/")
                    .set_body_string("<html></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = BrowserSession::connect(KaiConfig::new(server.uri()))
            .await
            .unwrap();

        let url: reqwest::Url = server.uri().parse().unwrap();
        let cookies = session.cookies().cookies(&url).unwrap();
        assert!(cookies.to_str().unwrap().contains("cf_clearance=abc"));
    }

    #[tokio::test]
    async fn warm_up_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = BrowserSession::connect(KaiConfig::new(server.uri())).await;
        assert!(matches!(
            result,
            Err(KaiError::UpstreamStatus { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_site_is_a_network_error() {
        // Nothing listens on port 9 locally
        let config = KaiConfig::new("http://127.0.0.1:9").with_timeout(2);
        let result = BrowserSession::connect(config).await;
        assert!(matches!(result, Err(KaiError::Network(_))));
    }

    #[tokio::test]
    async fn redirect_following_is_per_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/hop"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/landed"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/landed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("here"))
            .mount(&server)
            .await;

        let session = BrowserSession::connect(KaiConfig::new(server.uri()))
            .await
            .unwrap();
        let hop = format!("{}/hop", server.uri());

        let followed = session
            .get(&hop, &[], true, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(followed.url.ends_with("/landed"));
        assert_eq!(followed.body, "here");

        let stopped = session
            .get(&hop, &[], false, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(stopped.status, 302);
        assert!(stopped.url.ends_with("/hop"));
    }
}
