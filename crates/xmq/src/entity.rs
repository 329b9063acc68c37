/*
 * entity.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Character and named entities.

/// The name inside an entity token: `&amp;` gives `amp`.
pub fn entity_name(raw: &str) -> &str {
    let name = raw.strip_prefix('&').unwrap_or(raw);
    name.strip_suffix(';').unwrap_or(name)
}

/// Decode a numeric character reference or one of the five predefined XML
/// entities. Anything else is left for the caller to keep as a named entity.
pub fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Entity used to print a character that cannot appear bare.
pub fn char_entity(c: char) -> String {
    match c {
        '\'' => "&apos;".to_string(),
        '"' => "&quot;".to_string(),
        _ => format!("&#{};", c as u32),
    }
}
