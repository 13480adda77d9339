//! Filesystem-safe names from whatever the recognition service reports.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Anything that isn't a letter, number, underscore, whitespace, hyphen or period.
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_\s.\-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turns a card name into something that can be used as a file name.
///
/// 1. `&` becomes `and`.
/// 2. Accents are dropped: the name is NFD-decomposed and combining marks are
///    stripped, leaving the base letters (`Pokémon` becomes `Pokemon`).
/// 3. Everything except letters, numbers, underscores, whitespace, hyphens and
///    periods is removed.
/// 4. Runs of whitespace collapse to a single space; the ends are trimmed.
///
/// The result may be empty (e.g. a name made entirely of symbols). Callers
/// must treat that as a failed identification. Sanitizing is idempotent.
///
/// ```
/// use tcg_library::sanitize_filename;
/// assert_eq!(sanitize_filename("Pokémon & Friends"), "Pokemon and Friends");
/// assert_eq!(sanitize_filename("Jace, the Mind Sculptor"), "Jace the Mind Sculptor");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let name = name.replace('&', "and");
    let stripped: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let allowed = DISALLOWED.replace_all(&stripped, "");
    WHITESPACE.replace_all(&allowed, " ").trim().to_string()
}
