mod builder;
mod diff;
mod history;
mod notes;

pub use builder::{build_index, IndexBuilder};
pub use history::{fold_commits, Git2History};
pub use notes::{discover_notes, parse_note, NoteFile, ParsedNote};
