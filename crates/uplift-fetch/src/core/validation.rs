/// Check whether an HTTP status code is a redirect.
///
/// Recognizes 301, 302, 303, 307 and 308.
pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Check whether an HTTP status code is a 2xx success.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_redirect_all_codes() {
        for status in [301, 302, 303, 307, 308] {
            assert!(is_redirect(status), "{status}");
        }
    }

    #[test]
    fn test_is_redirect_other_codes() {
        assert!(!is_redirect(200));
        assert!(!is_redirect(304)); // Not Modified
        assert!(!is_redirect(404));
        assert!(!is_redirect(500));
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(206));
        assert!(!is_success(302));
        assert!(!is_success(404));
    }
}
