//! Record normalization helpers: numeric ids from reference URLs, display names
//! and sprite locations.

/// Derive the numeric id from a reference URL.
///
/// One trailing `/` is ignored, then the maximal run of trailing ASCII digits
/// is parsed. Returns `None` when there are no trailing digits or they do not
/// fit in a `u32`.
pub fn derive_numeric_id(reference: &str) -> Option<u32> {
    let trimmed = reference.strip_suffix('/').unwrap_or(reference);
    let digit_count = trimmed
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digit_count == 0 {
        return None;
    }

    trimmed[trimmed.len() - digit_count..].parse().ok()
}

/// Titlecase the first character if it is lowercase, leaving the rest
/// untouched.
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            let mut out = titlecase(first);
            out.push_str(chars.as_str());
            out
        }
        Some(_) => name.to_string(),
        None => String::new(),
    }
}

/// Titlecase form of a lowercase character. Digraphs have a dedicated
/// titlecase letter; multi-character expansions such as 'ß' keep only their
/// first letter uppercase ("Ss").
fn titlecase(c: char) -> String {
    match c {
        'ǆ' => "ǅ".to_string(),
        'ǉ' => "ǈ".to_string(),
        'ǌ' => "ǋ".to_string(),
        'ǳ' => "ǲ".to_string(),
        _ => {
            let mut upper = c.to_uppercase();
            let mut out = String::new();
            if let Some(head) = upper.next() {
                out.push(head);
            }
            out.extend(upper.flat_map(char::to_lowercase));
            out
        }
    }
}

/// `<sprite_base>/<id>.png`, tolerating a trailing slash on the base
pub fn sprite_url(sprite_base: &str, numeric_id: u32) -> String {
    format!("{}/{}.png", sprite_base.trim_end_matches('/'), numeric_id)
}
