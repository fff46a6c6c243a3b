//! Authorization header parsing

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Credentials extracted from a Basic authorization header
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse a Basic authorization header.
///
/// Returns `None` if the header is absent, not of Basic type, not valid
/// base64, or missing the `username:password` separator.
pub fn parse_basic_auth(authorization: Option<&str>) -> Option<BasicCredentials> {
    let header = match authorization {
        Some(header) => header,
        None => {
            tracing::debug!("authorization header missing");
            return None;
        }
    };

    let (scheme, payload) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        tracing::debug!(scheme, "authorization header is not of basic type");
        return None;
    }

    let decoded = STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Parse a Bearer authorization header.
///
/// Returns the token if the header consists of exactly two space-separated
/// parts, the first being `bearer` (case-insensitive) and the second
/// non-empty.
pub fn parse_bearer_token(authorization: Option<&str>) -> Option<&str> {
    let header = match authorization {
        Some(header) => header,
        None => {
            tracing::debug!("authorization header missing");
            return None;
        }
    };

    let mut parts = header.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() {
        tracing::debug!("authorization header has more than two parts");
        return None;
    }

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(scheme, "authorization header is not of bearer type");
        return None;
    }
    if token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_header(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
    }

    #[test]
    fn test_basic_auth_valid() {
        let header = basic_header("alice", "secret");
        let creds = parse_basic_auth(Some(&header)).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_basic_auth_password_may_contain_colon() {
        let header = basic_header("alice", "pa:ss");
        let creds = parse_basic_auth(Some(&header)).unwrap();
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn test_basic_auth_rejects_missing_and_malformed() {
        assert!(parse_basic_auth(None).is_none());
        assert!(parse_basic_auth(Some("Basic")).is_none());
        assert!(parse_basic_auth(Some("Basic !!!notbase64")).is_none());
        assert!(parse_basic_auth(Some("Bearer abc")).is_none());

        // Decoded payload without a colon
        let no_colon = format!("Basic {}", STANDARD.encode("alicesecret"));
        assert!(parse_basic_auth(Some(&no_colon)).is_none());
    }

    #[test]
    fn test_bearer_valid() {
        assert_eq!(parse_bearer_token(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(parse_bearer_token(Some("bearer abc123")), Some("abc123"));
    }

    #[test]
    fn test_bearer_rejects_malformed() {
        assert!(parse_bearer_token(None).is_none());
        assert!(parse_bearer_token(Some("Bearer")).is_none());
        assert!(parse_bearer_token(Some("Bearer ")).is_none());
        assert!(parse_bearer_token(Some("Bearer a b")).is_none());
        assert!(parse_bearer_token(Some("Basic abc")).is_none());
    }
}
