//! HTTP session: transport, cookie jar and CSRF token.
//!
//! The transport emulates Chrome 124 on Windows down to the TLS handshake
//! (cipher and extension order, GREASE, HTTP/2 settings), which is what the
//! forum's bot-mitigation edge scores first. Every request also goes out
//! with a clone of the browser header profile. The CSRF token lives behind
//! a lock so the client can be shared across tasks with `&self` methods; a
//! refresh replaces it atomically.

use crate::error::{classify_failure, ErrorBody};
use crate::headers::{self, ACCEPT_XHR, FORM_CONTENT_TYPE, HEADER_REQUESTED_WITH};
use crate::models::CsrfResponse;
use crate::proxy::resolve_system_proxy;
use crate::{ClientConfig, ForumError, ForumResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use session_cache_store::StoredCookie;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};
use wreq::cookie::Jar;
use wreq::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER};
use wreq::{Client, Proxy, RequestBuilder, StatusCode};
use wreq_util::{Emulation, Platform, Profile};

/// TLS, HTTP/2 and default-header profile of the browser we present as.
pub(crate) fn browser_emulation() -> Emulation {
    Emulation::builder()
        .profile(Profile::Chrome124)
        .platform(Platform::Windows)
        .build()
}

pub(crate) struct HttpSession {
    base_url: String,
    http: Client,
    jar: Arc<Jar>,
    headers: HeaderMap,
    csrf: RwLock<String>,
}

impl HttpSession {
    pub fn new(config: &ClientConfig) -> ForumResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        // Reject unusable base URLs before the transport sees them.
        url::Url::parse(&base_url)?;
        let jar = Arc::new(Jar::default());

        let mut builder = Client::builder()
            .emulation(browser_emulation())
            .cookie_provider(jar.clone())
            .timeout(config.timeout)
            .no_proxy();

        if config.use_system_proxy {
            if let Some(proxy) = resolve_system_proxy(&base_url)? {
                info!(proxy = %proxy.url, source = proxy.source, "Using outbound proxy");
                builder = builder.proxy(Proxy::all(proxy.url.as_str())?);
            }
        }

        Ok(Self {
            base_url,
            http: builder.build()?,
            jar,
            headers: headers::browser_headers(),
            csrf: RwLock::new(String::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path, or the value itself when already absolute.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn has_csrf_token(&self) -> bool {
        !self.csrf.read().unwrap().is_empty()
    }

    fn set_csrf_token(&self, token: String) {
        *self.csrf.write().unwrap() = token;
    }

    fn api_headers(&self) -> ForumResult<HeaderMap> {
        let token = self.csrf.read().unwrap().clone();
        headers::api_headers(&self.headers, &token)
            .map_err(|e| ForumError::validation(format!("unusable CSRF token: {}", e)))
    }

    fn header_value(value: &str) -> ForumResult<HeaderValue> {
        HeaderValue::from_str(value)
            .map_err(|e| ForumError::validation(format!("invalid header value: {}", e)))
    }

    /// Headers a browser sends from a page of this forum.
    fn page_headers(&self, referer_path: &str) -> ForumResult<HeaderMap> {
        let mut headers = self.api_headers()?;
        headers.insert(ORIGIN, Self::header_value(&self.base_url)?);
        headers.insert(REFERER, Self::header_value(&self.url(referer_path))?);
        Ok(headers)
    }

    /// Plain GET of the site root, like a browser landing on the homepage.
    pub async fn warmup(&self) -> ForumResult<()> {
        let endpoint = "/";
        let response = self
            .http
            .get(self.url(endpoint))
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, endpoint, "Warmup request rejected");
            return Err(classify_failure(status, endpoint, &body));
        }
        debug!(status = %status, "Warmup complete");
        Ok(())
    }

    /// Fetch a fresh CSRF token from `/session/csrf`.
    pub async fn refresh_csrf(&self) -> ForumResult<()> {
        let endpoint = "/session/csrf";
        let mut headers = self.headers.clone();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_XHR));
        headers.insert(HEADER_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(REFERER, Self::header_value(&self.url("/login"))?);

        let response = self
            .http
            .get(self.url(endpoint))
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = %status, endpoint, "CSRF fetch failed");
            return Err(classify_failure(status, endpoint, &body));
        }

        let parsed: CsrfResponse =
            serde_json::from_str(&body).map_err(|e| ForumError::decode(endpoint, e))?;
        if parsed.csrf.trim().is_empty() {
            return Err(ForumError::AuthFailure(
                "forum returned an empty CSRF token".to_string(),
            ));
        }
        self.set_csrf_token(parsed.csrf);
        debug!("CSRF token refreshed");
        Ok(())
    }

    /// POST the login form. Requires a CSRF token from [`Self::refresh_csrf`].
    pub async fn login(&self, username: &str, password: &str) -> ForumResult<()> {
        let endpoint = "/session";
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("login", username)
            .append_pair("password", password)
            .append_pair("second_factor_method", "1")
            .append_pair("timezone", "Asia/Shanghai")
            .finish();

        let mut headers = self.page_headers("/login")?;
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_XHR));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        let response = self
            .http
            .post(self.url(endpoint))
            .headers(headers)
            .body(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::FORBIDDEN {
            return Err(classify_failure(status, endpoint, &body));
        }

        let payload = ErrorBody::parse(&body);
        if let Some(message) = payload.error.clone().or_else(|| payload.message()) {
            warn!(username, "Login rejected by the forum");
            return Err(ForumError::AuthFailure(message));
        }
        if status != StatusCode::OK {
            error!(status = %status, endpoint, "Login failed");
            return Err(ForumError::AuthFailure(format!(
                "login returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(())
    }

    /// Send one request and return the body of a successful response.
    ///
    /// A `BAD CSRF` rejection refreshes the token before the error is
    /// returned, so a retry by the caller goes out with a fresh one.
    async fn execute(&self, request: RequestBuilder, endpoint: &str) -> ForumResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let err = classify_failure(status, endpoint, &body);
        match &err {
            ForumError::CsrfExpired { .. } => {
                warn!(endpoint, "CSRF token rejected, refreshing");
                if let Err(refresh_err) = self.refresh_csrf().await {
                    error!(endpoint, error = %refresh_err, "CSRF refresh failed");
                }
            }
            ForumError::Blocked { .. } => {
                error!(status = %status, endpoint, "Request blocked by anti-bot edge");
            }
            ForumError::RateLimited { wait_seconds, .. } => {
                warn!(endpoint, wait_seconds = ?wait_seconds, "Rate limited");
            }
            _ => {
                error!(status = %status, endpoint, "Request failed");
            }
        }
        Err(err)
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> ForumResult<T> {
        serde_json::from_str(body).map_err(|e| ForumError::decode(endpoint, e))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ForumResult<T> {
        debug!(endpoint = path, "GET");
        let request = self.http.get(self.url(path)).headers(self.api_headers()?);
        let body = self.execute(request, path).await?;
        Self::decode(path, &body)
    }

    /// POST a JSON body as if sent from the page at `referer_path`.
    pub async fn post_json<B, T>(&self, path: &str, body: &B, referer_path: &str) -> ForumResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(endpoint = path, "POST");
        let request = self
            .http
            .post(self.url(path))
            .headers(self.page_headers(referer_path)?)
            .json(body);
        let body = self.execute(request, path).await?;
        Self::decode(path, &body)
    }

    pub async fn delete(&self, path: &str) -> ForumResult<()> {
        debug!(endpoint = path, "DELETE");
        let request = self.http.delete(self.url(path)).headers(self.api_headers()?);
        self.execute(request, path).await?;
        Ok(())
    }

    /// Cookies currently held for the forum origin.
    pub fn export_cookies(&self) -> Vec<StoredCookie> {
        self.jar
            .matches(self.base_url.as_str())
            .map(|cookie| StoredCookie::new(cookie.name(), cookie.value()))
            .collect()
    }

    /// Load cached cookies into the jar.
    pub fn install_cookies(&self, cookies: &[StoredCookie]) {
        for cookie in cookies {
            self.jar.add(cookie.to_set_cookie(), self.base_url.as_str());
        }
        debug!(count = cookies.len(), "Installed cached cookies");
    }
}
