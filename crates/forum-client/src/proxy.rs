//! Outbound proxy resolution from the standard environment variables.
//!
//! The proxy variable must match the target's scheme: an `https://` forum
//! prefers `HTTPS_PROXY` and falls back to `HTTP_PROXY`, a plain `http://`
//! forum only ever consults `HTTP_PROXY`. Uppercase names win over
//! lowercase ones. A value that is present but unusable is a hard error.

use crate::{ForumError, ForumResult};
use url::Url;

const HTTPS_CANDIDATES: &[&str] = &["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"];
const HTTP_CANDIDATES: &[&str] = &["HTTP_PROXY", "http_proxy"];

/// A proxy chosen for the forum's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProxy {
    pub url: Url,
    /// Name of the variable the value came from.
    pub source: &'static str,
}

/// Resolve a proxy for `base_url` from the process environment.
pub fn resolve_system_proxy(base_url: &str) -> ForumResult<Option<ResolvedProxy>> {
    resolve_proxy_with(base_url, |name| std::env::var(name).ok())
}

/// Resolve a proxy for `base_url` through an arbitrary variable lookup.
pub fn resolve_proxy_with<F>(base_url: &str, lookup: F) -> ForumResult<Option<ResolvedProxy>>
where
    F: Fn(&str) -> Option<String>,
{
    let target = Url::parse(base_url)?;
    let candidates = match target.scheme() {
        "https" => HTTPS_CANDIDATES,
        "http" => HTTP_CANDIDATES,
        other => {
            return Err(ForumError::validation(format!(
                "unsupported forum URL scheme '{}'",
                other
            )))
        }
    };

    for &var in candidates {
        let Some(raw) = lookup(var) else {
            continue;
        };
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }

        let url = Url::parse(value).map_err(|e| ForumError::Proxy {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(ForumError::Proxy {
                var: var.to_string(),
                reason: format!("'{}' has no host", value),
            });
        }

        return Ok(Some(ResolvedProxy { url, source: var }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn https_target_prefers_https_proxy() {
        let resolved = resolve_proxy_with(
            "https://forum.example",
            env(&[
                ("HTTPS_PROXY", "http://p:7890"),
                ("HTTP_PROXY", "http://p2:8888"),
            ]),
        )
        .unwrap()
        .unwrap();

        assert_eq!(resolved.source, "HTTPS_PROXY");
        assert_eq!(resolved.url.as_str(), "http://p:7890/");
    }

    #[test]
    fn https_target_falls_back_to_http_proxy() {
        let resolved = resolve_proxy_with(
            "https://forum.example",
            env(&[("HTTP_PROXY", "http://p2:8888")]),
        )
        .unwrap()
        .unwrap();

        assert_eq!(resolved.source, "HTTP_PROXY");
        assert_eq!(resolved.url.port(), Some(8888));
    }

    #[test]
    fn no_variables_means_no_proxy() {
        assert!(resolve_proxy_with("https://forum.example", env(&[]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn http_target_ignores_https_proxy() {
        assert!(resolve_proxy_with(
            "http://forum.example",
            env(&[("HTTPS_PROXY", "http://p:7890")])
        )
        .unwrap()
        .is_none());

        let resolved = resolve_proxy_with(
            "http://forum.example",
            env(&[("HTTPS_PROXY", "http://p:7890"), ("http_proxy", "http://p3:1080")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.source, "http_proxy");
    }

    #[test]
    fn uppercase_wins_over_lowercase() {
        let resolved = resolve_proxy_with(
            "https://forum.example",
            env(&[
                ("https_proxy", "http://lower:1"),
                ("HTTPS_PROXY", "http://upper:2"),
            ]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.url.host_str(), Some("upper"));
    }

    #[test]
    fn values_are_trimmed_and_blank_values_skipped() {
        let resolved = resolve_proxy_with(
            "https://forum.example",
            env(&[("HTTPS_PROXY", "   "), ("HTTP_PROXY", "  http://p2:8888  ")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.source, "HTTP_PROXY");
        assert_eq!(resolved.url.host_str(), Some("p2"));
    }

    #[test]
    fn malformed_proxy_is_an_error() {
        let err = resolve_proxy_with("https://forum.example", env(&[("HTTPS_PROXY", "://bad")]))
            .unwrap_err();
        assert!(matches!(err, ForumError::Proxy { ref var, .. } if var == "HTTPS_PROXY"));
    }

    #[test]
    fn proxy_without_host_is_an_error() {
        let err = resolve_proxy_with("https://forum.example", env(&[("HTTPS_PROXY", "p:7890")]))
            .unwrap_err();
        assert!(matches!(err, ForumError::Proxy { .. }));
    }

    #[test]
    fn relative_base_url_is_an_error() {
        let err = resolve_proxy_with("linux.do", env(&[])).unwrap_err();
        assert!(matches!(err, ForumError::InvalidUrl(_)));
    }

    #[test]
    fn socks_proxy_values_are_accepted() {
        let resolved = resolve_proxy_with(
            "https://forum.example",
            env(&[("HTTPS_PROXY", "socks5://127.0.0.1:1080")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.url.scheme(), "socks5");
    }
}
