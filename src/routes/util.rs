//! Shared URL/form/HTML helpers for route handlers and the REST client.

/// Parse a URL-encoded body into key-value pairs.
/// Handles `key=value&key2=value2` format (HTMX POST bodies, URL fragments).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((percent_decode(key), percent_decode(val)))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. `+` decodes to a space.
/// Malformed escapes are kept verbatim; invalid UTF-8 is replaced.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Escape text for safe interpolation into HTML content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Dismissable error banner (Alpine `x-show`), used for every recoverable failure.
pub fn error_banner(message: &str) -> String {
    format!(
        r#"<div role="alert" x-data="{{ open: true }}" x-show="open" class="flex items-start justify-between gap-2 bg-red-100 border border-red-400 text-red-800 rounded px-3 py-2 text-sm"><span>{}</span><button type="button" aria-label="Dismiss" class="font-bold" @click="open = false">&times;</button></div>"#,
        escape_html(message)
    )
}

/// Short informational notice.
pub fn notice(message: &str) -> String {
    format!(
        r#"<div role="status" class="bg-amber-100 border border-amber-300 text-amber-800 rounded px-3 py-2 text-sm">{}</div>"#,
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_form_body_works() {
        let pairs = parse_form_body("field=perk1&value=Dead+Hard&action=select");
        assert_eq!(pairs.len(), 3);
        assert_eq!(get_param(&pairs, "field"), Some("perk1"));
        assert_eq!(get_param(&pairs, "value"), Some("Dead Hard"));
    }

    #[test]
    fn parse_form_body_empty() {
        assert!(parse_form_body("").is_empty());
    }

    #[test]
    fn percent_decode_plus_as_space() {
        assert_eq!(percent_decode("hello+world"), "hello world");
    }

    #[test]
    fn percent_decode_hex() {
        assert_eq!(percent_decode("hello%20world"), "hello world");
    }

    #[test]
    fn percent_decode_multibyte() {
        assert_eq!(percent_decode("caf%C3%A9"), "café");
    }

    #[test]
    fn percent_decode_keeps_malformed_escape() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn parse_query_strips_prefix() {
        let pairs = parse_query("?foo=bar");
        assert_eq!(get_param(&pairs, "foo"), Some("bar"));
    }

    #[test]
    fn escape_html_escapes_markup() {
        assert_eq!(
            escape_html(r#"<b class="x">Tom & 'Jerry'</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn error_banner_is_dismissable() {
        let html = error_banner("Could not load <channel>");
        assert!(html.contains("@click=\"open = false\""));
        assert!(html.contains("&lt;channel&gt;"));
    }
}
