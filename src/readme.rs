// src/readme.rs

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;
use tracing::{info, warn};

/// A marker-delimited region of the document and the text that belongs in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub start: String,
    pub end: String,
    pub content: String,
}

impl Section {
    /// Region delimited by `<!--START_SECTION:name-->` and `<!--END_SECTION:name-->`.
    pub fn named(name: &str, content: impl Into<String>) -> Self {
        Section {
            start: format!("<!--START_SECTION:{name}-->"),
            end: format!("<!--END_SECTION:{name}-->"),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingStart,
    MissingEnd,
    /// The region would overlap one claimed by an earlier section
    Overlaps,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingStart => f.write_str("start marker not found"),
            SkipReason::MissingEnd => f.write_str("no end marker after the start marker"),
            SkipReason::Overlaps => f.write_str("region overlaps another section"),
        }
    }
}

/// A section left untouched, identified by its start marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub marker: String,
    pub reason: SkipReason,
}

#[derive(Debug)]
struct Edit {
    /// Bytes strictly between the start marker and the end marker
    body: Range<usize>,
    replacement: String,
}

/// All replacements for one document, computed before any is applied
#[derive(Debug)]
pub struct Plan {
    edits: Vec<Edit>,
    pub skipped: Vec<Skipped>,
}

impl Plan {
    pub fn applied(&self) -> usize {
        self.edits.len()
    }

    /// Splices every planned replacement into `document`. The plan must come
    /// from the same document.
    pub fn apply(&self, document: &str) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|e| std::cmp::Reverse(e.body.start));

        let mut updated = document.to_string();
        for edit in edits {
            updated.replace_range(edit.body.clone(), &edit.replacement);
        }
        updated
    }
}

/// Locates every section in one pass over `document`.
///
/// Each section takes the first occurrence of its start marker and the first
/// occurrence of its own end marker after it. Sections whose region is
/// incomplete, or collides with an earlier section's region, are skipped.
pub fn plan(document: &str, sections: &[Section]) -> Plan {
    let bytes = document.as_bytes();
    let mut first_start: Vec<Option<usize>> = vec![None; sections.len()];
    let mut ends: Vec<Vec<usize>> = vec![Vec::new(); sections.len()];

    // Markers are whole UTF-8 strings, so a match always sits on a char boundary
    for at in 0..bytes.len() {
        let rest = &bytes[at..];
        for (i, section) in sections.iter().enumerate() {
            if first_start[i].is_none()
                && !section.start.is_empty()
                && rest.starts_with(section.start.as_bytes())
            {
                first_start[i] = Some(at);
            }
            if !section.end.is_empty() && rest.starts_with(section.end.as_bytes()) {
                ends[i].push(at);
            }
        }
    }

    let mut edits = Vec::new();
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut skipped = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        let skip = |reason| Skipped {
            marker: section.start.clone(),
            reason,
        };
        let Some(start) = first_start[i] else {
            skipped.push(skip(SkipReason::MissingStart));
            continue;
        };
        let body_start = start + section.start.len();
        let Some(&end) = ends[i].iter().find(|&&end| end >= body_start) else {
            skipped.push(skip(SkipReason::MissingEnd));
            continue;
        };

        let region = start..end + section.end.len();
        if claimed
            .iter()
            .any(|other| region.start < other.end && other.start < region.end)
        {
            skipped.push(skip(SkipReason::Overlaps));
            continue;
        }

        claimed.push(region);
        edits.push(Edit {
            body: body_start..end,
            replacement: format!("\n{}\n", section.content),
        });
    }

    Plan { edits, skipped }
}

/// Rewrites every section found in `document`, warning about the rest.
pub fn update(document: &str, sections: &[Section]) -> (String, Plan) {
    let plan = plan(document, sections);
    for skipped in &plan.skipped {
        warn!("Skipping README section {}: {}", skipped.marker, skipped.reason);
    }
    (plan.apply(document), plan)
}

/// Read-modify-write of the document at `path`. The write is not atomic.
pub fn update_file(path: &Path, sections: &[Section]) -> Result<Plan> {
    let document = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let (updated, plan) = update(&document, sections);
    fs::write(path, updated).map_err(|e| Error::io(path, e))?;
    info!(
        "Updated {} of {} sections in {}",
        plan.applied(),
        sections.len(),
        path.display()
    );
    Ok(plan)
}
