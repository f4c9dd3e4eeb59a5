//! Text cleaning pass applied to extracted HTML and PDF text

/// Phrases stripped wherever they occur
pub const BOILERPLATE: &[&str] = &["Read more", "Sponsored", "Copyright", "Follow us", "Learn more"];

/// Collapses whitespace runs, strips boilerplate phrases and trims
///
/// Stripping a phrase can join text into a new phrase or leave a double
/// space behind, so collapse and strip repeat until nothing changes. The
/// result therefore satisfies `clean_text(&clean_text(s)) == clean_text(s)`.
///
/// # Examples
///
/// ```
/// use link_digest::extraction::clean_text;
///
/// assert_eq!(clean_text("  Hello\n\n  World  "), "Hello World");
/// assert_eq!(clean_text("Story text. Read more Follow us"), "Story text.");
/// ```
pub fn clean_text(text: &str) -> String {
    let mut current = collapse_whitespace(text);
    loop {
        let stripped = strip_boilerplate(&current);
        if stripped == current {
            return current;
        }
        current = collapse_whitespace(&stripped);
    }
}

/// Joins whitespace-separated words with single spaces, dropping edges
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_boilerplate(text: &str) -> String {
    BOILERPLATE
        .iter()
        .fold(text.to_string(), |acc, phrase| acc.replace(phrase, ""))
}
