//! Browser-shaped request headers.
//!
//! The forum sits behind a bot-mitigation edge that scores requests on how
//! closely they resemble a desktop Chrome. Every request starts from the
//! same header profile; API calls then layer the XHR markers and the CSRF
//! token on top.

use wreq::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

pub const HEADER_CSRF_TOKEN: &str = "x-csrf-token";
pub const HEADER_REQUESTED_WITH: &str = "x-requested-with";

const SEC_CH_UA: &str = r#""Chromium";v="124", "Google Chrome";v="124", "Not-A.Brand";v="99""#;
const SEC_CH_UA_PLATFORM: &str = r#""Windows""#;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
     image/webp,image/apng,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";

/// `Accept` used for JSON API calls.
pub const ACCEPT_JSON: &str = "application/json";
/// `Accept` used by the forum's own login page when it fetches a CSRF token.
pub const ACCEPT_XHR: &str = "application/json, text/javascript, */*; q=0.01";
/// Login form content type.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// The shared Chrome 124 / Windows header set.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs: [(&'static str, &'static str); 7] = [
        ("sec-ch-ua", SEC_CH_UA),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", SEC_CH_UA_PLATFORM),
        ("upgrade-insecure-requests", "1"),
        ("user-agent", USER_AGENT),
        ("accept", ACCEPT_HTML),
        ("accept-language", ACCEPT_LANGUAGE),
    ];
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Headers for an authenticated API call: the browser profile plus JSON
/// accept, the XHR marker and the current CSRF token.
pub fn api_headers(base: &HeaderMap, csrf_token: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = base.clone();
    headers.insert(
        wreq::header::ACCEPT,
        HeaderValue::from_static(ACCEPT_JSON),
    );
    headers.insert(
        HeaderName::from_static(HEADER_REQUESTED_WITH),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    if !csrf_token.is_empty() {
        let mut token = HeaderValue::from_str(csrf_token)?;
        token.set_sensitive(true);
        headers.insert(HeaderName::from_static(HEADER_CSRF_TOKEN), token);
    }
    Ok(headers)
}
