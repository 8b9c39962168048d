use til_types::{BuildSummary, Config, History, Renderer, Result, Store, TilError};

use crate::history::Git2History;
use crate::notes::{discover_notes, parse_note, NoteFile};

/// Turns the note files under the configured root into `til` rows.
pub struct IndexBuilder<'a> {
    store: &'a dyn Store,
    renderer: &'a dyn Renderer,
    config: &'a Config,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(store: &'a dyn Store, renderer: &'a dyn Renderer, config: &'a Config) -> Self {
        Self {
            store,
            renderer,
            config,
        }
    }

    /// Index every note, then rebuild the full-text index.
    ///
    /// Notes are written one at a time, so a fatal error on one note leaves
    /// the notes before it committed and never writes the failing one.
    pub fn build(&self, history: &History) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();

        for file in discover_notes(&self.config.root, &self.config.pattern)? {
            self.index_note(&file, history, &mut summary)?;
            summary.notes_seen += 1;
        }

        self.store.enable_fts()?;
        Ok(summary)
    }

    fn index_note(&self, file: &NoteFile, history: &History, summary: &mut BuildSummary) -> Result<()> {
        let content = std::fs::read_to_string(&file.absolute_path)?;
        let mut record = file.to_record(&parse_note(&content), self.config);

        let times = history.get(&file.relative_path);
        if times.is_none() && !self.config.allow_untracked {
            return Err(TilError::MissingTimestamps(file.relative_path.clone()));
        }

        let previous = self.store.get_note(&record.path)?;
        if record.needs_render(previous.as_ref()) {
            let html = self
                .renderer
                .render(&record.body)
                .map_err(|source| TilError::Render {
                    path: file.relative_path.clone(),
                    source,
                })?;
            tracing::info!(path = %file.relative_path, "rendered HTML");
            record.html = Some(html);
            summary.notes_rendered += 1;
        } else {
            tracing::debug!(path = %file.relative_path, "body unchanged, keeping stored HTML");
            record.html = previous.and_then(|p| p.html);
            summary.notes_unchanged += 1;
        }

        match times {
            Some(times) => record.merge_timestamps(times),
            None => {
                tracing::warn!(path = %file.relative_path, "no commit history, timestamps left as stored");
                summary.notes_untracked += 1;
            }
        }

        self.store.upsert_note(&record)
    }
}

/// Scan the configured branch's history and index every note.
pub fn build_index(config: &Config, store: &dyn Store, renderer: &dyn Renderer) -> Result<BuildSummary> {
    let history = Git2History::open(&config.root)?.scan(&config.branch)?;
    IndexBuilder::new(store, renderer, config).build(&history)
}
