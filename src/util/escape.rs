//! Entity decoding and escaping.
//!
//! Decoding recognises the five predefined XML entities and numeric
//! character references (`&#NN;`, `&#xHH;`). Anything else that looks like a
//! reference (`&tasty;`, `&#xD800;`, a lone `&`) is left in the text verbatim.
//!
//! Escaping is the inverse for serializer output: text content escapes
//! `&`, `<`, `>`; attribute values additionally escape both quote characters.

use std::borrow::Cow;

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Replaces entity and character references in `text`.
///
/// # Examples
///
/// ```
/// use simpletree::util::escape::decode_entities;
///
/// assert_eq!(decode_entities("a &amp; b &#65;&#x42;"), "a & b AB");
/// assert_eq!(decode_entities("&tasty;"), "&tasty;");
/// ```
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if memchr::memchr(b'&', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = memchr::memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        // A reference cannot contain '&', so the search stops at the next one.
        let resolved = memchr::memchr2(b';', b'&', after.as_bytes())
            .filter(|&end| after.as_bytes()[end] == b';')
            .and_then(|semi| resolve_reference(&after[..semi]).map(|ch| (ch, semi)));
        match resolved {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Resolves the body of a reference (between `&` and `;`).
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code_point = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                    u32::from_str_radix(hex, 16).ok()?
                }
                Some(_) => return None,
                None if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) => {
                    number.parse::<u32>().ok()?
                }
                None => return None,
            };
            char::from_u32(code_point).filter(|&c| is_xml_char(c))
        }
    }
}

/// Escapes text content (`&`, `<`, `>`).
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape_with(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

/// Escapes an attribute value (`&`, `<`, `>`, `"`, `'`).
///
/// # Examples
///
/// ```
/// use simpletree::util::escape::escape_attr;
///
/// assert_eq!(escape_attr(r#"say "hi" & 'bye'"#), "say &quot;hi&quot; &amp; &apos;bye&apos;");
/// ```
#[must_use]
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape_with(value, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&apos;"),
        _ => None,
    })
}

fn escape_with(text: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = text.find(|c| replacement(c).is_some()) else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + 8);
    out.push_str(&text[..first]);
    for ch in text[first..].chars() {
        match replacement(ch) {
            Some(entity) => out.push_str(entity),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}
