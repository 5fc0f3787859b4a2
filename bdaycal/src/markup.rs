//! Normalization helpers shared by every payload extraction.

/// Strip the anti-hijack prefix the service puts in front of AJAX JSON
/// responses. Without this the payload is not valid JSON.
pub fn strip_ajax_prefix(payload: &str) -> &str {
    payload.strip_prefix("for (;;);").unwrap_or(payload)
}

/// Decode HTML character references in attribute text.
///
/// Handles numeric references (`&#xHH;`, `&#DD;`) and the small named set
/// that shows up in the service's markup. Unknown references pass through
/// unchanged.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some(end) = rest.find(';') else {
            break;
        };

        match decode_entity(&rest[1..end]) {
            Some(decoded) => {
                out.push_str(&decoded);
                rest = &rest[end + 1..];
            }
            None => {
                // Not a reference we know; emit the ampersand and rescan.
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        let code = u32::from_str_radix(hex, 16).ok()?;
        return char::from_u32(code).map(String::from);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        let code = dec.parse::<u32>().ok()?;
        return char::from_u32(code).map(String::from);
    }

    let named = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => return None,
    };
    Some(named.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ajax_prefix() {
        assert_eq!(strip_ajax_prefix("for (;;);{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_ajax_prefix("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("D&#xfc;rer"), "D\u{fc}rer");
        assert_eq!(decode_entities("a&#228;b"), "a\u{e4}b");
    }

    #[test]
    fn decodes_named_references() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&quot;x&quot;"), "\"x\"");
    }

    #[test]
    fn passes_unknown_references_through() {
        assert_eq!(decode_entities("&bogus; &"), "&bogus; &");
    }
}
