//! Deterministic title → slug derivation.
//!
//! The transform is fixed so the admin console, the persistence service,
//! and the public site all agree on what a title turns into: lowercase,
//! strip diacritics, drop everything outside `[a-z0-9\s-]`, then join the
//! remaining words with single dashes. Unlike generic slugifiers, removed
//! punctuation does not leave a dash behind (`"rock'n'roll"` becomes
//! `rocknroll`, not `rock-n-roll`).

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Derive a slug from a human-readable title.
///
/// Total and idempotent: every input produces a (possibly empty) slug, and
/// `derive_slug(derive_slug(s)) == derive_slug(s)` for all `s`.
pub fn derive_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered.nfd().filter(|ch| !is_combining_mark(*ch)).collect();

    let filtered: String = stripped
        .chars()
        .filter(|ch| matches!(ch, 'a'..='z' | '0'..='9' | '-') || ch.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(filtered.len());
    let mut previous_dash = false;
    for ch in filtered.trim().chars() {
        let mapped = if ch.is_whitespace() { '-' } else { ch };
        if mapped == '-' {
            if !previous_dash {
                slug.push('-');
            }
            previous_dash = true;
        } else {
            slug.push(mapped);
            previous_dash = false;
        }
    }
    slug
}
