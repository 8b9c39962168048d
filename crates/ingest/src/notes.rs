use globset::GlobBuilder;
use std::path::{Path, PathBuf};
use til_types::{Config, NoteRecord, Result, TilError};
use walkdir::WalkDir;

/// A note file found under the notes root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    /// `/`-separated path relative to the root, e.g. `rust/traits.md`.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    /// Top-level directory.
    pub topic: String,
    /// Immediate parent directory, used in the published URL.
    pub parent: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNote {
    pub title: String,
    pub body: String,
}

/// Split a note into its title (first line, heading markers removed) and its
/// body (everything after the first line). CRLF line endings become `\n`.
pub fn parse_note(content: &str) -> ParsedNote {
    let content = content.replace("\r\n", "\n");
    let (first, rest) = content.split_once('\n').unwrap_or((content.as_str(), ""));
    ParsedNote {
        title: first.trim_start_matches('#').trim().to_string(),
        body: rest.trim().to_string(),
    }
}

/// All files under `root` matching `pattern`, sorted by relative path.
/// `*` does not cross directory boundaries. Hidden files and directories
/// (`.github/`, `.draft.md`) are never notes, even when the glob would
/// match them.
pub fn discover_notes(root: &Path, pattern: &str) -> Result<Vec<NoteFile>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| TilError::Pattern(e.to_string()))?
        .compile_matcher();
    let depth = pattern.split('/').count();

    let mut notes = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
    for entry in walker {
        let entry = entry.map_err(|e| TilError::Ingest(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else { continue };
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let relative_path = parts.join("/");
        if parts.len() < 2 || !matcher.is_match(&relative_path) {
            continue;
        }

        let slug = entry
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        notes.push(NoteFile {
            topic: parts[0].clone(),
            parent: parts[parts.len() - 2].clone(),
            slug,
            absolute_path: entry.path().to_path_buf(),
            relative_path,
        });
    }

    notes.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(notes)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

impl NoteFile {
    /// Record for this note without html or timestamps.
    pub fn to_record(&self, parsed: &ParsedNote, config: &Config) -> NoteRecord {
        NoteRecord {
            path: NoteRecord::key_for(&self.relative_path),
            slug: self.slug.clone(),
            topic: self.topic.clone(),
            title: parsed.title.clone(),
            url: config.note_url(&self.parent, &self.slug),
            body: parsed.body.clone(),
            html: None,
            created: None,
            created_utc: None,
            updated: None,
            updated_utc: None,
        }
    }
}
