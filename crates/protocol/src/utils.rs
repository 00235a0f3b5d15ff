//! Request-logging helpers shared by the HTTP boundary.

/// Pick the client address to log for a request, preferring proxy
/// headers over the socket address (`x-real-ip` then
/// `x-forwarded-for` then the connection's remote address).
#[must_use]
pub fn read_user_ip(x_real_ip: Option<&str>, x_forwarded_for: Option<&str>, remote_addr: &str) -> String {
    if let Some(ip) = x_real_ip.filter(|s| !s.is_empty()) {
        return ip.to_string();
    }
    if let Some(ip) = x_forwarded_for.filter(|s| !s.is_empty()) {
        return ip.to_string();
    }
    remote_addr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_x_real_ip() {
        assert_eq!(
            read_user_ip(Some("1.1.1.1"), Some("2.2.2.2"), "3.3.3.3:1234"),
            "1.1.1.1"
        );
    }

    #[test]
    fn falls_back_to_x_forwarded_for() {
        assert_eq!(
            read_user_ip(None, Some("2.2.2.2"), "3.3.3.3:1234"),
            "2.2.2.2"
        );
    }

    #[test]
    fn falls_back_to_remote_addr() {
        assert_eq!(read_user_ip(None, None, "3.3.3.3:1234"), "3.3.3.3:1234");
    }

    #[test]
    fn empty_headers_are_treated_as_absent() {
        assert_eq!(read_user_ip(Some(""), Some(""), "3.3.3.3:1234"), "3.3.3.3:1234");
    }
}
