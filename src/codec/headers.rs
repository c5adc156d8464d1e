//! Decoded header-list validation.
//!
//! After the compression engine yields a flat name/value list, the rules
//! here turn it into an [`HttpMessage`] or a rejection reason. Failures at
//! this tier are stream errors: the caller reports HTTP 400 and the
//! connection keeps going.

use crate::hpack::HeaderField;
use crate::message::HttpMessage;

/// Hop-by-hop names that never travel inside an HTTP/2 header block.
/// `Host` is carried by the `:authority` pseudo-header instead.
pub fn is_per_hop(name: &str) -> bool {
    name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("host")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("proxy-connection")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("upgrade")
}

/// RFC 7230 token.
pub fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Field values: horizontal tab or printable ASCII.
fn is_valid_header_value(s: &str) -> bool {
    s.bytes().all(|b| b == b'\t' || (0x20..=0x7e).contains(&b))
}

/// Paths: non-empty, no whitespace or control bytes.
fn is_valid_path(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b > 0x20 && b != 0x7f)
}

/// Accumulates request pseudo-headers with duplicate and syntax checks,
/// holding the first failure until [`validate`](Self::validate).
#[derive(Debug, Default)]
pub struct RequestVerifier {
    method: Option<String>,
    path: Option<String>,
    scheme: Option<String>,
    authority: Option<String>,
    error: Option<String>,
}

impl RequestVerifier {
    pub fn set_method(&mut self, method: &str) -> bool {
        if self.method.is_some() {
            return self.fail("Duplicate method");
        }
        if !is_token(method) {
            return self.fail("Invalid method");
        }
        self.method = Some(method.to_string());
        true
    }

    pub fn set_path(&mut self, path: &str) -> bool {
        if self.path.is_some() {
            return self.fail("Duplicate path");
        }
        if !is_valid_path(path) {
            return self.fail("Invalid url");
        }
        self.path = Some(path.to_string());
        true
    }

    pub fn set_scheme(&mut self, scheme: &str) -> bool {
        if self.scheme.is_some() {
            return self.fail("Duplicate scheme");
        }
        if !is_alpha(scheme) {
            return self.fail("Invalid scheme");
        }
        self.scheme = Some(scheme.to_string());
        true
    }

    pub fn set_authority(&mut self, authority: &str) -> bool {
        if self.authority.is_some() {
            return self.fail("Duplicate authority");
        }
        if !is_valid_header_value(authority) {
            return self.fail("Invalid authority");
        }
        self.authority = Some(authority.to_string());
        true
    }

    /// Check request-shape completeness. CONNECT carries method and
    /// authority only; everything else needs method, scheme and path.
    pub fn validate(&mut self) {
        if self.error.is_some() {
            return;
        }
        let connect = self.method.as_deref() == Some("CONNECT");
        if connect {
            if self.authority.is_none() || self.scheme.is_some() || self.path.is_some() {
                self.error = Some(format!(
                    "Malformed CONNECT request m/a/s/p={}{}{}{}",
                    self.method.is_some() as u8,
                    self.authority.is_some() as u8,
                    self.scheme.is_some() as u8,
                    self.path.is_some() as u8
                ));
            }
        } else if self.method.is_none() || self.scheme.is_none() || self.path.is_none() {
            self.error = Some(format!(
                "Malformed request m/a/s/p={}{}{}{}",
                self.method.is_some() as u8,
                self.authority.is_some() as u8,
                self.scheme.is_some() as u8,
                self.path.is_some() as u8
            ));
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fail(&mut self, reason: &str) -> bool {
        self.error = Some(reason.to_string());
        false
    }
}

/// Validate a decoded header list and build the message it describes.
///
/// `is_request` selects the pseudo-header grammar: requests take
/// `:method`/`:scheme`/`:authority`/`:path`, responses take exactly one
/// `:status`. Pseudo-headers must precede all regular headers.
pub fn parse_header_list(
    fields: Vec<HeaderField>,
    is_request: bool,
) -> Result<HttpMessage, String> {
    let mut msg = HttpMessage::new();
    let mut verifier = RequestVerifier::default();
    let mut has_status = false;
    let mut regular_seen = false;

    for field in &fields {
        let HeaderField { name, value } = field;
        if name.starts_with(':') {
            if regular_seen {
                return Err(format!("Illegal pseudo header name={}", name));
            }
            if is_request {
                let ok = match name.as_str() {
                    ":method" => verifier.set_method(value),
                    ":scheme" => verifier.set_scheme(value),
                    ":authority" => verifier.set_authority(value),
                    ":path" => verifier.set_path(value),
                    _ => return Err(format!("Invalid header name={}", name)),
                };
                if !ok {
                    break;
                }
            } else if name == ":status" {
                if has_status {
                    return Err("Duplicate status".to_string());
                }
                has_status = true;
                match value.parse::<u32>() {
                    Ok(code) if (100..=999).contains(&code) => msg.set_status(code as u16),
                    _ => return Err(format!("Malformed status code={}", value)),
                }
            } else {
                return Err(format!("Invalid header name={}", name));
            }
        } else {
            regular_seen = true;
            if name.eq_ignore_ascii_case("connection") {
                return Err("HTTP/2 message with Connection header".to_string());
            }
            let name_ok = is_token(name);
            let value_ok = is_valid_header_value(value);
            msg.headers_mut().add(name.clone(), value.clone());
            if !name_ok || !value_ok {
                return Err("Bad header value".to_string());
            }
        }
    }

    if is_request {
        verifier.validate();
        if let Some(error) = verifier.error() {
            return Err(error.to_string());
        }

        let RequestVerifier {
            method,
            path,
            scheme,
            authority,
            ..
        } = verifier;
        if let Some(method) = method {
            msg.set_method(method);
        }
        if let Some(path) = path {
            msg.set_url(path);
        }
        msg.set_secure(scheme.as_deref() == Some("https"));
        if let Some(authority) = authority {
            msg.headers_mut().add("Host", authority);
        }

        let combined_cookie = msg.headers().combine("cookie", "; ");
        if !combined_cookie.is_empty() {
            msg.headers_mut().set("Cookie", combined_cookie);
        }
    } else if !has_status {
        return Err("Malformed response, missing :status".to_string());
    }

    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(list: &[(&str, &str)]) -> Vec<HeaderField> {
        list.iter().map(|(n, v)| HeaderField::new(*n, *v)).collect()
    }

    #[test]
    fn test_minimal_request() {
        let msg = parse_header_list(
            fields(&[
                (":method", "GET"),
                (":scheme", "https"),
                (":path", "/index.html"),
                (":authority", "example.com"),
            ]),
            true,
        )
        .unwrap();

        assert_eq!(msg.method(), Some("GET"));
        assert_eq!(msg.url(), Some("/index.html"));
        assert!(msg.is_secure());
        assert_eq!(msg.headers().get("host"), Some("example.com"));
    }

    #[test]
    fn test_http_scheme_not_secure() {
        let msg = parse_header_list(
            fields(&[(":method", "GET"), (":scheme", "http"), (":path", "/")]),
            true,
        )
        .unwrap();
        assert!(!msg.is_secure());
    }

    #[test]
    fn test_missing_scheme_rejected() {
        let err =
            parse_header_list(fields(&[(":method", "GET"), (":path", "/")]), true).unwrap_err();
        assert!(err.starts_with("Malformed request"));
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let err = parse_header_list(
            fields(&[
                (":method", "GET"),
                (":method", "POST"),
                (":scheme", "http"),
                (":path", "/"),
            ]),
            true,
        )
        .unwrap_err();
        assert_eq!(err, "Duplicate method");
    }

    #[test]
    fn test_invalid_method_rejected() {
        let err = parse_header_list(
            fields(&[(":method", "GE T"), (":scheme", "http"), (":path", "/")]),
            true,
        )
        .unwrap_err();
        assert_eq!(err, "Invalid method");
    }

    #[test]
    fn test_unknown_pseudo_rejected() {
        let err = parse_header_list(
            fields(&[(":verb", "GET"), (":scheme", "http"), (":path", "/")]),
            true,
        )
        .unwrap_err();
        assert_eq!(err, "Invalid header name=:verb");
    }

    #[test]
    fn test_pseudo_after_regular_rejected() {
        let err = parse_header_list(
            fields(&[
                (":method", "GET"),
                (":scheme", "http"),
                ("accept", "*/*"),
                (":path", "/"),
            ]),
            true,
        )
        .unwrap_err();
        assert_eq!(err, "Illegal pseudo header name=:path");
    }

    #[test]
    fn test_connect_request() {
        let msg = parse_header_list(
            fields(&[(":method", "CONNECT"), (":authority", "example.com:443")]),
            true,
        )
        .unwrap();
        assert_eq!(msg.method(), Some("CONNECT"));
        assert_eq!(msg.url(), None);
    }

    #[test]
    fn test_connect_with_path_rejected() {
        let err = parse_header_list(
            fields(&[
                (":method", "CONNECT"),
                (":authority", "example.com:443"),
                (":path", "/"),
            ]),
            true,
        )
        .unwrap_err();
        assert!(err.starts_with("Malformed CONNECT request"));
    }

    #[test]
    fn test_connect_without_authority_rejected() {
        let err = parse_header_list(fields(&[(":method", "CONNECT")]), true).unwrap_err();
        assert!(err.starts_with("Malformed CONNECT request"));
    }

    #[test]
    fn test_connection_header_rejected() {
        let err = parse_header_list(
            fields(&[
                (":method", "GET"),
                (":scheme", "http"),
                (":path", "/"),
                ("Connection", "keep-alive"),
            ]),
            true,
        )
        .unwrap_err();
        assert_eq!(err, "HTTP/2 message with Connection header");
    }

    #[test]
    fn test_bad_header_value_rejected() {
        let err = parse_header_list(
            fields(&[
                (":method", "GET"),
                (":scheme", "http"),
                (":path", "/"),
                ("x-bad", "line\r\nbreak"),
            ]),
            true,
        )
        .unwrap_err();
        assert_eq!(err, "Bad header value");
    }

    #[test]
    fn test_cookie_coalescing() {
        let msg = parse_header_list(
            fields(&[
                (":method", "GET"),
                (":scheme", "http"),
                (":path", "/"),
                ("cookie", "a=1"),
                ("cookie", "b=2"),
                ("cookie", "c=3"),
            ]),
            true,
        )
        .unwrap();
        assert_eq!(msg.headers().get_all("cookie"), vec!["a=1; b=2; c=3"]);
    }

    #[test]
    fn test_response_status() {
        let msg = parse_header_list(fields(&[(":status", "204")]), false).unwrap();
        assert_eq!(msg.status(), Some(204));
        assert!(!msg.is_request());
    }

    #[test]
    fn test_response_missing_status_rejected() {
        let err = parse_header_list(fields(&[("server", "unit-test")]), false).unwrap_err();
        assert_eq!(err, "Malformed response, missing :status");
    }

    #[test]
    fn test_response_duplicate_status_rejected() {
        let err =
            parse_header_list(fields(&[(":status", "200"), (":status", "204")]), false)
                .unwrap_err();
        assert_eq!(err, "Duplicate status");
    }

    #[test]
    fn test_response_status_out_of_range() {
        let err = parse_header_list(fields(&[(":status", "99")]), false).unwrap_err();
        assert_eq!(err, "Malformed status code=99");

        let err = parse_header_list(fields(&[(":status", "abc")]), false).unwrap_err();
        assert_eq!(err, "Malformed status code=abc");
    }

    #[test]
    fn test_response_rejects_request_pseudo() {
        let err =
            parse_header_list(fields(&[(":method", "GET"), (":status", "200")]), false)
                .unwrap_err();
        assert_eq!(err, "Invalid header name=:method");
    }

    #[test]
    fn test_per_hop_set() {
        assert!(is_per_hop("Connection"));
        assert!(is_per_hop("host"));
        assert!(is_per_hop("Keep-Alive"));
        assert!(is_per_hop("proxy-connection"));
        assert!(is_per_hop("Transfer-Encoding"));
        assert!(is_per_hop("upgrade"));
        assert!(!is_per_hop("content-length"));
        assert!(!is_per_hop("te"));
    }

    #[test]
    fn test_token_rules() {
        assert!(is_token("GET"));
        assert!(is_token("x-custom-1"));
        assert!(!is_token(""));
        assert!(!is_token("has space"));
        assert!(!is_token("colon:name"));
    }
}
