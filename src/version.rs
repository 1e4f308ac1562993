use std::collections::BTreeSet;

use tracing::warn;

use crate::error::Error;

/// Highest version number the naming scheme can express.
pub const MAX_VERSION: u32 = 9999;

/// Versions above this trip an operator warning so renumbering can happen
/// before the hard stop.
pub const VERSION_WARNING_THRESHOLD: u32 = 9900;

/// Length of the `-NNNN.<ext>` tail of a versioned file name.
const VERSIONED_TAIL_LEN: usize = 9;

/// Extract the version number from a file name of the form
/// `<base>-NNNN.<ext>` (hyphen at `len-9`, dot at `len-4`, four decimal
/// digits). Returns -1 if the name does not have that exact shape. A value
/// of 0 parses but is treated as unversioned by [`is_versioned`].
pub fn version_number(file_name: &str) -> i32 {
    let bytes = file_name.as_bytes();
    let len = bytes.len();
    if len < VERSIONED_TAIL_LEN + 1 {
        return -1;
    }
    if bytes[len - 9] != b'-' || bytes[len - 4] != b'.' {
        return -1;
    }
    let digits = &file_name[len - 8..len - 4];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return -1;
    }
    digits.parse::<i32>().unwrap_or(-1)
}

/// True iff the name follows the versioned naming scheme with a version
/// number in 1..=9999. Version 0 is not a valid version.
pub fn is_versioned(file_name: &str) -> bool {
    version_number(file_name) > 0
}

/// The logical archive identity of a file name: the version suffix and
/// extension are stripped for versioned names, just the extension for
/// unversioned ones.
pub fn base_name(file_name: &str) -> &str {
    if is_versioned(file_name) {
        &file_name[..file_name.len() - VERSIONED_TAIL_LEN]
    } else {
        match file_name.rfind('.') {
            Some(idx) => &file_name[..idx],
            None => file_name,
        }
    }
}

/// Render a versioned file name. `extension` is given without the dot and
/// must be the three-character archive extension for the name to round-trip
/// through [`version_number`].
pub fn versioned_name(base: &str, extension: &str, version: u32) -> String {
    format!("{}-{:04}.{}", base, version, extension)
}

/// File name for the next version after `current_latest`. Fails once 9999
/// is reached; the operator must renumber the archive set by hand.
pub fn next_version_name(
    base: &str,
    extension: &str,
    current_latest: u32,
) -> Result<String, Error> {
    if current_latest >= MAX_VERSION {
        return Err(Error::VersionNumbersExhausted(base.to_string()));
    }
    let next = current_latest + 1;
    if next > VERSION_WARNING_THRESHOLD {
        warn!(
            "Version numbers for '{}' approaching the 9999 limit ({} used); renumber soon",
            base, next
        );
    }
    Ok(versioned_name(base, extension, next))
}

/// Ordered set of versioned file names sharing one base name. Lexical order
/// is chronological order because version numbers are fixed-width
/// zero-padded decimal.
#[derive(Debug, Clone)]
pub struct VersionSet {
    base_name: String,
    file_names: BTreeSet<String>,
}

impl VersionSet {
    pub fn new(base_name: &str) -> Self {
        Self {
            base_name: base_name.to_string(),
            file_names: BTreeSet::new(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn insert(&mut self, file_name: &str) {
        self.file_names.insert(file_name.to_string());
    }

    /// Versioned file names in ascending (oldest-first) order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.file_names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }

    pub fn latest_file_name(&self) -> Option<&str> {
        self.file_names.iter().next_back().map(String::as_str)
    }

    /// Version number of the lexically last entry, 0 when the set is empty.
    pub fn latest_version_number(&self) -> u32 {
        self.latest_file_name()
            .map(|name| version_number(name).max(0) as u32)
            .unwrap_or(0)
    }
}
