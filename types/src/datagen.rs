//! Unique names and filler data for test resources.

use uuid::Uuid;

const NAME_SUFFIX_LEN: usize = 8;

/// `prefix` followed by 8 random hex characters.
#[must_use]
pub fn rand_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &suffix[..NAME_SUFFIX_LEN])
}

/// Random lowercase hex string of exactly `len` characters.
#[must_use]
pub fn random_string(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.push_str(&Uuid::new_v4().simple().to_string());
    }
    out.truncate(len);
    out
}

/// Make a resource name usable as part of a test name.
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '.' | '-' | ':' | '(' | ')' => '_',
            other => other,
        })
        .collect()
}
