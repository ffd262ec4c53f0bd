//! HTML escaping, URL escaping and entity/backslash unescaping.
//!
//! Fast-path optimized: scans for the first escapable byte,
//! then bulk-copies segments between escapes.

use memchr::{memchr, memchr3};

/// Lookup table for bytes that need escaping in HTML text and attributes.
const HTML_ESCAPE_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    table[b'<' as usize] = true;
    table[b'>' as usize] = true;
    table[b'&' as usize] = true;
    table[b'"' as usize] = true;
    table
};

/// Bytes that pass through `href` escaping untouched.
const HREF_SAFE_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    let mut b = 0;
    while b < 256 {
        table[b] = (b as u8).is_ascii_alphanumeric();
        b += 1;
    }
    let extra = b"-_.!~*'();/?:@&=+$,#%";
    let mut i = 0;
    while i < extra.len() {
        table[extra[i] as usize] = true;
        i += 1;
    }
    table
};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Escape HTML text content or an attribute value into `out`.
///
/// Escapes `<`, `>`, `&` and `"`.
///
/// # Example
/// ```
/// use gfmark::escape::escape_html_into;
///
/// let mut out = Vec::new();
/// escape_html_into(&mut out, b"<b>&");
/// assert_eq!(out, b"&lt;b&gt;&amp;");
/// ```
#[inline]
pub fn escape_html_into(out: &mut Vec<u8>, input: &[u8]) {
    let mut pos = match first_escape(input) {
        Some(p) => p,
        None => {
            out.extend_from_slice(input);
            return;
        }
    };
    out.extend_from_slice(&input[..pos]);

    while pos < input.len() {
        let scan_start = pos;
        while pos < input.len() && !HTML_ESCAPE_TABLE[input[pos] as usize] {
            pos += 1;
        }
        out.extend_from_slice(&input[scan_start..pos]);

        if let Some(&b) = input.get(pos) {
            out.extend_from_slice(match b {
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                b'&' => b"&amp;",
                _ => b"&quot;",
            });
            pos += 1;
        }
    }
}

#[inline]
fn first_escape(input: &[u8]) -> Option<usize> {
    match (memchr3(b'<', b'>', b'&', input), memchr(b'"', input)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Whether `input` contains anything [`escape_html_into`] would change.
#[inline]
pub fn needs_escape(input: &[u8]) -> bool {
    input.iter().any(|&b| HTML_ESCAPE_TABLE[b as usize])
}

/// Escape and return as a String.
///
/// Prefer `escape_html_into` to reuse buffers.
pub fn escape_html(input: &str) -> String {
    let mut out = Vec::with_capacity(input.len() + input.len() / 8);
    escape_html_into(&mut out, input.as_bytes());
    // only ASCII sequences were inserted between valid UTF-8 segments
    String::from_utf8(out).unwrap_or_default()
}

/// Escape a URL for use in an `href` or `src` attribute.
///
/// Safe characters pass through, `&` and `'` become entities and
/// everything else is percent-encoded byte by byte.
pub fn escape_href_into(out: &mut Vec<u8>, url: &[u8]) {
    for &b in url {
        if HREF_SAFE_TABLE[b as usize] {
            match b {
                b'&' => out.extend_from_slice(b"&amp;"),
                b'\'' => out.extend_from_slice(b"&#x27;"),
                _ => out.push(b),
            }
        } else {
            out.push(b'%');
            out.push(HEX[(b >> 4) as usize]);
            out.push(HEX[(b & 0xF) as usize]);
        }
    }
}

/// Check if a character is ASCII punctuation (can be backslash-escaped).
#[inline]
pub fn is_ascii_punctuation(b: u8) -> bool {
    b.is_ascii_punctuation()
}

/// Decode the entity or numeric character reference starting at `pos`
/// (which must be `&`). Returns the decoded text and the offset after `;`.
pub fn decode_entity(text: &[u8], pos: usize) -> Option<(String, usize)> {
    let rest = text.get(pos + 1..)?;
    if let Some(numeric) = rest.strip_prefix(b"#") {
        let (hex, digits_start) = match numeric.first() {
            Some(b'x' | b'X') => (true, 1),
            _ => (false, 0),
        };
        let digits = numeric[digits_start..]
            .iter()
            .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            .count();
        let max = if hex { 6 } else { 7 };
        if digits == 0 || digits > max || numeric.get(digits_start + digits) != Some(&b';') {
            return None;
        }
        let raw = std::str::from_utf8(&numeric[digits_start..digits_start + digits]).ok()?;
        let code = u32::from_str_radix(raw, if hex { 16 } else { 10 }).ok()?;
        let ch = match code {
            0 => char::REPLACEMENT_CHARACTER,
            _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
        };
        let end = pos + 2 + digits_start + digits + 1;
        return Some((ch.to_string(), end));
    }

    let name_len = rest
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len < 2 || name_len > 32 || rest.get(name_len) != Some(&b';') {
        return None;
    }
    if !rest[0].is_ascii_alphabetic() {
        return None;
    }
    let entity = std::str::from_utf8(&text[pos..pos + name_len + 2]).ok()?;
    let decoded = html_escape::decode_html_entities(entity);
    // a legacy prefix like `&copy` decoded inside `&copyx;` leaves a tail
    if decoded == entity || decoded.chars().count() > 2 {
        return None;
    }
    Some((decoded.into_owned(), pos + name_len + 2))
}

/// Resolve entity references only, leaving backslashes alone.
///
/// Autolink targets and text keep their backslashes.
pub fn decode_entities(text: &[u8]) -> String {
    let mut out = Vec::with_capacity(text.len());
    let mut pos = 0;
    while let Some(amp) = memchr(b'&', &text[pos..]) {
        out.extend_from_slice(&text[pos..pos + amp]);
        pos += amp;
        match decode_entity(text, pos) {
            Some((decoded, end)) => {
                out.extend_from_slice(decoded.as_bytes());
                pos = end;
            }
            None => {
                out.push(b'&');
                pos += 1;
            }
        }
    }
    out.extend_from_slice(&text[pos..]);
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Resolve backslash escapes only.
///
/// Fenced code info strings run this after [`decode_entities`], so an
/// escaped `\&amp;` ends up as a literal `&`.
pub fn unescape_backslashes(text: &[u8]) -> String {
    let mut out = Vec::with_capacity(text.len());
    let mut pos = 0;
    while let Some(bs) = memchr(b'\\', &text[pos..]) {
        out.extend_from_slice(&text[pos..pos + bs]);
        pos += bs;
        match text.get(pos + 1) {
            Some(&next) if is_ascii_punctuation(next) => {
                out.push(next);
                pos += 2;
            }
            _ => {
                out.push(b'\\');
                pos += 1;
            }
        }
    }
    out.extend_from_slice(&text[pos..]);
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Resolve backslash escapes and entity references.
///
/// Used for link destinations, titles, info strings and footnote labels.
pub fn unescape(text: &[u8]) -> String {
    let mut out = Vec::with_capacity(text.len());
    let mut pos = 0;
    while pos < text.len() {
        let b = text[pos];
        match b {
            b'\\' if text.get(pos + 1).is_some_and(|&n| is_ascii_punctuation(n)) => {
                out.push(text[pos + 1]);
                pos += 2;
            }
            b'&' => match decode_entity(text, pos) {
                Some((decoded, end)) => {
                    out.extend_from_slice(decoded.as_bytes());
                    pos = end;
                }
                None => {
                    out.push(b'&');
                    pos += 1;
                }
            },
            _ => {
                out.push(b);
                pos += 1;
            }
        }
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
