//! Extraction of the authoritative content hash from vcpkg's
//! hash-mismatch diagnostics.
//!
//! The trial build installs with a placeholder hash precisely to provoke
//! the mismatch error that carries the real one. The scrape is kept
//! behind this one narrow function so drift in vcpkg's message format is
//! caught at a single seam.

use regex::Regex;

use crate::domain::release::ContentHash;

/// Scrape the `Actual hash:` line out of a failed install's output.
///
/// Returns `None` when no such line is present. For the trial build that
/// is the real failure condition -- distinct from the install command's
/// expected nonzero exit.
pub fn extract_actual_hash(output: &str) -> Option<ContentHash> {
    let re = Regex::new(r"Actual hash:\s+([0-9a-fA-F]+)").expect("valid regex");
    re.captures(output).map(|caps| ContentHash::new(&caps[1]))
}
