//! Tag list parsing, normalisation, and tag-set diffing.
//!
//! Users type tags as a single space-separated line. Parsing keeps the raw
//! split (so consecutive spaces produce empty entries); normalisation at
//! persistence time drops blanks and collapses duplicates.

use std::collections::HashSet;

use crate::models::Tag;

/// Split a message into tag titles on single spaces.
///
/// Consecutive spaces yield empty entries; they are dropped later by
/// [`normalize_tags`].
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(' ').map(str::to_string).collect()
}

/// Drop blank entries and collapse duplicates, keeping first occurrence order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag.trim().is_empty() || !seen.insert(tag.as_str()) {
            continue;
        }
        out.push(tag.clone());
    }
    out
}

/// Link changes needed to move a note from its stored tags to a new tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Stored tags no longer present in the new list.
    pub unlink: Vec<Tag>,
    /// Titles in the new list that the note is not linked to yet.
    pub link: Vec<String>,
}

impl TagDiff {
    /// Compute the diff between stored tags and a submitted tag list.
    ///
    /// The submitted list is normalised first, so blanks and duplicates never
    /// produce link operations.
    pub fn compute(stored: &[Tag], submitted: &[String]) -> Self {
        let wanted = normalize_tags(submitted);
        let wanted_set: HashSet<&str> = wanted.iter().map(String::as_str).collect();
        let stored_set: HashSet<&str> = stored.iter().map(|t| t.title.as_str()).collect();

        let unlink = stored
            .iter()
            .filter(|t| !wanted_set.contains(t.title.as_str()))
            .cloned()
            .collect();
        let link = wanted
            .iter()
            .filter(|t| !stored_set.contains(t.as_str()))
            .cloned()
            .collect();

        Self { unlink, link }
    }

    /// True when applying the diff would not change anything.
    pub fn is_empty(&self) -> bool {
        self.unlink.is_empty() && self.link.is_empty()
    }
}
