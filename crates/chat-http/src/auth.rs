//! Auth failure classification for HTTP responses

use chat_protocol::AuthErrorKind;

/// Extract the `error` parameter from a `WWW-Authenticate` challenge
///
/// `Bearer realm="api", error="token_expired"` yields `token_expired`. The
/// parameter name is matched case-insensitively.
#[must_use]
pub fn challenge_error(header: &str) -> Option<&str> {
    header.split(',').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        // the first parameter is preceded by the auth scheme
        let key = key.split_whitespace().next_back()?;
        key.eq_ignore_ascii_case("error")
            .then(|| value.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
    })
}

/// Classify a failed response
///
/// Sources are consulted in order: the challenge header (401 only), the
/// envelope status code, then the payload's `error` string.
#[must_use]
pub fn classify(
    http_status: u16,
    challenge: Option<&str>,
    status_code: i64,
    embedded_error: Option<&str>,
) -> Option<AuthErrorKind> {
    let from_challenge = if http_status == 401 {
        challenge
            .and_then(challenge_error)
            .and_then(AuthErrorKind::from_marker)
    } else {
        None
    };

    from_challenge
        .or_else(|| AuthErrorKind::from_status_code(status_code))
        .or_else(|| embedded_error.and_then(AuthErrorKind::from_marker))
}
