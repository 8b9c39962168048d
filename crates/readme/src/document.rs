use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};
use til_types::{Result, TilError};

const INDEX_BLOCK_RE: &str = r"(?s)<!-- index starts -->.*<!-- index ends -->";
const COUNT_BADGE_RE: &str = r"count-\d+-green";

/// What a rewrite actually found in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub index_replaced: bool,
    pub badge_replaced: bool,
}

/// Replace the marker-bounded block with `index` and every `count-<N>-green`
/// badge with `count`. Text outside those matches is kept byte for byte;
/// with no markers the document comes back unchanged.
pub fn rewrite_document(contents: &str, index: &str, count: usize) -> Result<(String, RewriteOutcome)> {
    let index_re = Regex::new(INDEX_BLOCK_RE).map_err(|e| TilError::Pattern(e.to_string()))?;
    let count_re = Regex::new(COUNT_BADGE_RE).map_err(|e| TilError::Pattern(e.to_string()))?;

    let outcome = RewriteOutcome {
        index_replaced: index_re.is_match(contents),
        badge_replaced: count_re.is_match(contents),
    };
    let badge = format!("count-{}-green", count);
    let rewritten = index_re.replace_all(contents, NoExpand(index.trim()));
    let rewritten = count_re.replace_all(&rewritten, NoExpand(&badge)).into_owned();
    Ok((rewritten, outcome))
}

/// A `## ` section of the summary document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    /// Non-empty lines after the heading, marker-end line excluded.
    pub lines: Vec<String>,
}

impl Section {
    /// `Github Actions` -> `github_actions`.
    pub fn directory_name(&self) -> String {
        self.heading.to_lowercase().replace(' ', "_")
    }

    pub fn render(&self) -> String {
        format!("## {}\n\n{}", self.heading, self.lines.join("\n"))
    }
}

/// Split a document on its level-two headings. Text before the first
/// heading belongs to no section.
pub fn split_sections(contents: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for line in contents.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            sections.push(Section {
                heading: heading.trim().to_string(),
                lines: Vec::new(),
            });
            continue;
        }
        let Some(current) = sections.last_mut() else { continue };
        if line.is_empty() || line.contains("index ends") {
            continue;
        }
        current.lines.push(line.to_string());
    }
    sections
}

/// Write every section of `contents` to `<root>/<section dir>/<file_name>`.
/// Sections without a matching directory are skipped.
pub fn write_subsections(root: &Path, contents: &str, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for section in split_sections(contents) {
        let dir = root.join(section.directory_name());
        if !dir.is_dir() {
            tracing::warn!(heading = %section.heading, dir = %dir.display(), "no directory for section, skipping");
            continue;
        }
        let path = dir.join(file_name);
        std::fs::write(&path, section.render())?;
        written.push(path);
    }
    Ok(written)
}
