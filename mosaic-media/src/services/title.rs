//! Group key slug to display title formatting
//!
//! Pure and deterministic; ASCII case folding only.

/// Format a group key slug into a human-readable title.
///
/// The slug may carry one colon separating a section prefix from the rest
/// ("panel:kurdistan-at-a-crossroads" becomes
/// "Panel: Kurdistan At A Crossroads"). Within each section, hyphens become
/// spaces and every word gets its first letter upper-cased.
pub fn format_title(slug: &str) -> String {
    match slug.split_once(':') {
        Some((head, tail)) => format!("{}: {}", capitalize_words(head), capitalize_words(tail)),
        None => capitalize_words(slug),
    }
}

fn capitalize_words(section: &str) -> String {
    section
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first character, leave the rest untouched
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
