use memchr::memchr;

/// Longest entity we try to match, `&` and `;` included (`&#x10FFFF;`).
const MAX_ENTITY_LEN: usize = 10;

/// Decode the small entity subset the host parser understands.
///
/// Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// Numeric: `&#123;` and `&#x1F4A9;`, semicolon-terminated, valid scalar values only.
/// Anything else, including a missing semicolon, is left as literal text.
pub(crate) fn decode_entities(text: &str) -> String {
    let Some(first) = memchr(b'&', text.as_bytes()) else {
        return text.to_string();
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first]);
    let mut rest = &text[first..];

    while !rest.is_empty() {
        // `rest` always starts at an `&` here.
        match decode_one(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
        match memchr(b'&', rest.as_bytes()) {
            Some(next) => {
                out.push_str(&rest[..next]);
                rest = &rest[next..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

fn decode_one(s: &str) -> Option<(char, usize)> {
    let semicolon = s
        .as_bytes()
        .iter()
        .take(MAX_ENTITY_LEN)
        .position(|&b| b == b';')?;
    let body = &s[1..semicolon];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{A0}',
        _ => decode_numeric(body)?,
    };
    Some((ch, semicolon + 1))
}

fn decode_numeric(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let (digits, radix) = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (digits, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = u32::from_str_radix(digits, radix).ok()?;
    if value == 0 {
        return None;
    }
    char::from_u32(value)
}
