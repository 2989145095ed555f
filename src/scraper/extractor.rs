use regex::Regex;
use std::collections::BTreeSet;

use crate::errors::{MonitorError, Result};

/// Pulls item identifiers out of rendered markup with a configured regex.
///
/// When the pattern has a capture group, the first group is the identifier;
/// otherwise the whole match is. `\((\d{4})\)` therefore yields `1234` from
/// `Jacket (1234)`.
#[derive(Debug, Clone)]
pub struct IdExtractor {
    pattern: Regex,
}

impl IdExtractor {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| MonitorError::Config(format!("id_pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Sorted, de-duplicated identifiers found in `html`.
    #[cfg(test)]
    pub fn extract(&self, html: &str) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        self.extract_into(html, &mut ids);
        ids
    }

    /// Adds matches to `acc` and returns how many were new.
    pub fn extract_into(&self, html: &str, acc: &mut BTreeSet<String>) -> usize {
        let before = acc.len();
        for caps in self.pattern.captures_iter(html) {
            let m = caps.get(1).or_else(|| caps.get(0));
            if let Some(m) = m {
                acc.insert(m.as_str().to_string());
            }
        }
        acc.len() - before
    }
}
