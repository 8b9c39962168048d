mod document;
mod index;

pub use document::{rewrite_document, split_sections, write_subsections, RewriteOutcome, Section};
pub use index::{build_index, group_by_topic, title_case, topic_heading, INDEX_END, INDEX_START};

use std::path::PathBuf;
use til_types::{Config, Result, Store, TilError};

/// Result of one regeneration pass.
#[derive(Debug, Clone)]
pub struct Regenerated {
    /// The generated marker block.
    pub index: String,
    /// Set only when the root document was rewritten.
    pub rewrite: Option<RewriteOutcome>,
    /// Subsection files written.
    pub subsections: Vec<PathBuf>,
}

/// Build the summary block from the store and, with `rewrite`, splice it
/// into the root document. The root document is then split into
/// per-topic subsection files either way.
///
/// A missing root document is an error when rewriting; otherwise the split
/// is skipped.
pub fn regenerate(config: &Config, store: &dyn Store, rewrite: bool) -> Result<Regenerated> {
    let notes = store.notes_by_created()?;
    let index = build_index(&notes);
    let readme = config.readme_path();

    if !readme.is_file() {
        if rewrite {
            return Err(TilError::NotFound(format!(
                "summary document {}",
                readme.display()
            )));
        }
        tracing::warn!(path = %readme.display(), "summary document missing, no subsections written");
        return Ok(Regenerated {
            index,
            rewrite: None,
            subsections: Vec::new(),
        });
    }

    let mut contents = std::fs::read_to_string(&readme)?;
    let outcome = if rewrite {
        let (rewritten, outcome) = rewrite_document(&contents, &index, store.count_notes()?)?;
        if !outcome.index_replaced {
            tracing::warn!(path = %readme.display(), "index markers not found, block left unchanged");
        }
        if !outcome.badge_replaced {
            tracing::debug!(path = %readme.display(), "no count badge found");
        }
        if rewritten != contents {
            std::fs::write(&readme, &rewritten)?;
            contents = rewritten;
        }
        Some(outcome)
    } else {
        None
    };

    let subsections = write_subsections(&config.root, &contents, &config.readme.subsection_file)?;
    Ok(Regenerated {
        index,
        rewrite: outcome,
        subsections,
    })
}
