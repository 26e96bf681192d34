// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISO 10303-21 string escaping
//!
//! Strings live on the tape in their escaped file form. `decode` produces the
//! text application code sees, `encode` turns it back into file form.
//!
//! Supported escapes: `''`, `\\`, `\S\c`, `\X\hh`, `\X2\...\X0\`,
//! `\X4\...\X0\`. Code page switches (`\P?\`) are accepted and ignored.

/// Decode an escaped STEP string into plain text
pub fn decode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];

        if rest.starts_with("''") {
            out.push('\'');
            i += 2;
        } else if rest.starts_with("\\\\") {
            out.push('\\');
            i += 2;
        } else if let Some(hex) = rest.strip_prefix("\\X2\\") {
            let (consumed, text) = decode_wide(hex, 4);
            out.push_str(&text);
            i += 4 + consumed;
        } else if let Some(hex) = rest.strip_prefix("\\X4\\") {
            let (consumed, text) = decode_wide(hex, 8);
            out.push_str(&text);
            i += 4 + consumed;
        } else if let Some(c) = rest.strip_prefix("\\X\\").and_then(decode_latin1) {
            out.push(c);
            i += 5;
        } else if let Some(c) = rest.strip_prefix("\\S\\").and_then(|r| r.chars().next()) {
            // \S\ shifts the following character into the upper half of ISO 8859
            match char::from_u32(c as u32 + 0x80) {
                Some(shifted) if c.is_ascii() => out.push(shifted),
                _ => out.push(c),
            }
            i += 3 + c.len_utf8();
        } else if is_code_page(rest) {
            i += 4;
        } else {
            // Safe: `i` always sits on a char boundary
            let c = rest.chars().next().unwrap_or('\u{FFFD}');
            out.push(c);
            i += c.len_utf8();
        }
    }

    out
}

/// Escape plain text into STEP string form (without surrounding quotes)
pub fn encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut wide: Vec<u16> = Vec::new();

    for c in input.chars() {
        if c.is_ascii() {
            flush_wide(&mut out, &mut wide);
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        } else {
            let mut buf = [0u16; 2];
            wide.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush_wide(&mut out, &mut wide);

    out
}

fn flush_wide(out: &mut String, wide: &mut Vec<u16>) {
    if wide.is_empty() {
        return;
    }
    out.push_str("\\X2\\");
    for unit in wide.iter() {
        out.push_str(&format!("{:04X}", unit));
    }
    out.push_str("\\X0\\");
    wide.clear();
}

/// Decode the hex body of an `\X2\` or `\X4\` run.
/// Returns bytes consumed (including the closing `\X0\`) and the text.
fn decode_wide(hex: &str, digits: usize) -> (usize, String) {
    let (body, consumed) = match hex.find("\\X0\\") {
        Some(end) => (&hex[..end], end + 4),
        None => (hex, hex.len()),
    };

    let groups = body
        .as_bytes()
        .chunks(digits)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|chunk| u32::from_str_radix(chunk, 16).ok());

    let text = if digits == 4 {
        let units: Vec<u16> = groups.map(|g| g as u16).collect();
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else {
        groups
            .map(|g| char::from_u32(g).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    };

    (consumed, text)
}

fn decode_latin1(rest: &str) -> Option<char> {
    let hex = rest.get(..2)?;
    let byte = u8::from_str_radix(hex, 16).ok()?;
    Some(byte as char)
}

fn is_code_page(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() >= 4
        && bytes[0] == b'\\'
        && bytes[1] == b'P'
        && bytes[2].is_ascii_uppercase()
        && bytes[3] == b'\\'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_and_backslashes() {
        assert_eq!(decode("it''s"), "it's");
        assert_eq!(decode("C:\\\\temp"), "C:\\temp");
        assert_eq!(encode("it's"), "it''s");
        assert_eq!(encode("C:\\temp"), "C:\\\\temp");
    }

    #[test]
    fn test_wide_runs() {
        assert_eq!(decode("\\X2\\00E4\\X0\\"), "ä");
        assert_eq!(decode("Gr\\X2\\00FC00DF\\X0\\e"), "Grüße");
        assert_eq!(decode("\\X4\\0001F600\\X0\\"), "😀");
        assert_eq!(encode("Grüße"), "Gr\\X2\\00FC00DF\\X0\\e");
    }

    #[test]
    fn test_latin1_and_shift() {
        assert_eq!(decode("\\X\\E9t\\X\\E9"), "été");
        assert_eq!(decode("\\S\\d"), "ä");
        assert_eq!(decode("\\PA\\abc"), "abc");
    }

    #[test]
    fn test_escape_lookalikes_survive() {
        for text in ["\\X2\\", "a\\b", "''", "😀 mixed ä text", ""] {
            assert_eq!(decode(&encode(text)), text);
        }
    }
}
