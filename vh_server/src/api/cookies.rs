//! Bearer-token cookie helpers.
//!
//! Tokens ride in `HttpOnly; Secure; SameSite=Strict` cookies when the
//! delivery policy asks for them. Non-browser clients use the response
//! body instead, so nothing here is load-bearing for the lifecycle.

use axum::http::HeaderMap;

/// Cookie name for the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie name for the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Build a Set-Cookie value for a bearer token
pub fn bearer_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        name, value, max_age_secs
    )
}

/// Build a Set-Cookie value that clears a bearer cookie
pub fn clear_cookie(name: &str) -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0",
        name
    )
}

/// Extract a cookie value from the request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_cookie_attributes() {
        let cookie = bearer_cookie(ACCESS_TOKEN_COOKIE, "tok", 900);
        assert!(cookie.starts_with("access_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=900"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_cookie(REFRESH_TOKEN_COOKIE);
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("a=1; refresh_token=abc.def; b=2"),
        );

        assert_eq!(
            cookie_value(&headers, REFRESH_TOKEN_COOKIE).as_deref(),
            Some("abc.def")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
