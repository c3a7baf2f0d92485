//! Output filename resolution.
//!
//! Every entry is named `<timestamp>_<last>_<first>_<suffix><ext>`. When two
//! files resolve to the same name the later one gets a `-N` counter before
//! the extension, so names stay unique and depend only on input order.

use chrono::NaiveDateTime;
use std::collections::HashSet;

use crate::model::Customer;

/// Timestamp layout used in the filename prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Build the per-request filename prefix.
pub fn file_prefix(timestamp: NaiveDateTime, customer: &Customer) -> String {
    format!(
        "{}_{}_{}",
        timestamp.format(TIMESTAMP_FORMAT),
        sanitize(&customer.last_name),
        sanitize(&customer.first_name)
    )
}

/// Lower-cased extension of a document name, including the leading dot.
///
/// The extension starts at the last `.` of the final path component, so a
/// dotfile such as `.pdf` is all extension and `notes.` yields `.`. Returns
/// an empty string when that component has no dot.
pub fn extension_of(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rfind('.')
        .map(|dot| base[dot..].to_lowercase())
        .unwrap_or_default()
}

/// Replace characters that would move an entry out of the archive root.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            c => c,
        })
        .collect()
}

/// Resolves unique entry names for one request.
#[derive(Debug, Clone)]
pub struct FilenameResolver {
    prefix: String,
    used: HashSet<String>,
}

impl FilenameResolver {
    /// Create a resolver for the given prefix with no names taken yet.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            used: HashSet::new(),
        }
    }

    /// Create a resolver whose prefix is built from a timestamp and customer.
    pub fn for_customer(timestamp: NaiveDateTime, customer: &Customer) -> Self {
        Self::new(file_prefix(timestamp, customer))
    }

    /// The shared prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Resolve and reserve a name for `suffix` and `extension`.
    ///
    /// `extension` is appended verbatim and should include its dot.
    pub fn resolve(&mut self, suffix: &str, extension: &str) -> String {
        let suffix = sanitize(suffix);
        let mut candidate = format!("{}_{}{}", self.prefix, suffix, extension);
        let mut counter = 1;

        while self.used.contains(&candidate) {
            candidate = format!("{}_{}-{}{}", self.prefix, suffix, counter, extension);
            counter += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }

    /// Number of names handed out so far.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Whether no names have been handed out yet.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
