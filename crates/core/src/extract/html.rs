//! Minimal HTML entity decoding for captured text.

/// Decode named and numeric character references.
///
/// Unknown or malformed references are left as-is.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match tail[1..].find(';').filter(|&end| end > 0 && end <= 10) {
            Some(end) => {
                let name = &tail[1..=end];
                match decode_reference(name) {
                    Some(c) => out.push(c),
                    None => out.push_str(&tail[..end + 2]),
                }
                rest = &tail[end + 2..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "reg" => '®',
        "trade" => '™',
        "copy" => '©',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "rsquo" => '\u{2019}',
        "lsquo" => '\u{2018}',
        "rdquo" => '\u{201d}',
        "ldquo" => '\u{201c}',
        _ => return None,
    };
    Some(c)
}

/// Decode then trim; `None` when nothing but whitespace is left.
pub(crate) fn clean_capture(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw.trim());
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("Valve&trade;"), "Valve™");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_entities("Rock &#38; Roll"), "Rock & Roll");
        assert_eq!(decode_entities("caf&#xE9;"), "café");
        assert_eq!(decode_entities("&#10004;"), "✔");
    }

    #[test]
    fn test_unknown_and_malformed_pass_through() {
        assert_eq!(decode_entities("&bogus; text"), "&bogus; text");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("trailing &"), "trailing &");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn test_clean_capture() {
        assert_eq!(clean_capture("  Action  ").as_deref(), Some("Action"));
        assert_eq!(clean_capture(" &nbsp; "), None);
        assert_eq!(clean_capture(""), None);
    }
}
