use std::path::Path;
use std::sync::Mutex;

use til_ingest::build_index;
use til_readme::regenerate;
use til_store::SqliteStore;
use til_types::{Config, RenderFailure, Renderer, Store};

const README: &str = "# TIL\n\n\
![count](https://img.shields.io/badge/count-0-green)\n\n\
<!-- index starts -->\n\
<!-- index ends -->\n\n\
Footer stays put.\n";

struct RecordingRenderer {
    calls: Mutex<Vec<String>>,
}

impl Renderer for RecordingRenderer {
    fn render(&self, text: &str) -> Result<String, RenderFailure> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(format!("<p>{}</p>", text))
    }
}

fn recording() -> RecordingRenderer {
    RecordingRenderer {
        calls: Mutex::new(Vec::new()),
    }
}

fn commit(repo: &git2::Repository, root: &Path, files: &[(&str, &str)], secs: i64, offset_minutes: i32) {
    let mut index = repo.index().unwrap();
    for (path, content) in files {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::new("Test User", "test@example.com", &git2::Time::new(secs, offset_minutes)).unwrap();
    let parents: Vec<git2::Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => vec![],
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "update notes", &tree, &parent_refs)
        .unwrap();
}

#[test]
fn test_end_to_end() {
    // 1. A notes repository with three commits at known times
    let repo_dir = tempfile::tempdir().unwrap();
    let root = repo_dir.path();
    let repo = git2::Repository::init(root).unwrap();

    // 2021-03-01T12:00:00Z
    let t0 = 1_614_600_000;
    let day = 86_400;
    commit(
        &repo,
        root,
        &[
            ("README.md", README),
            ("rust/traits.md", "# Traits\n\nShared behaviour between types.\n"),
        ],
        t0,
        60,
    );
    commit(&repo, root, &[("git/rebase.md", "# Rebase\n\nRewriting branches onto a new base.\n")], t0 + day, 0);
    commit(&repo, root, &[("rust/lifetimes.md", "# Lifetimes\n\nBorrows that outlive their owner.\n")], t0 + 2 * day, -300);

    let config = Config {
        root: root.to_path_buf(),
        branch: "HEAD".to_string(),
        ..Config::default()
    };

    // 2. Build the index into an on-disk database
    let db_dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&db_dir.path().join("tils.db")).unwrap();
    let renderer = recording();
    let summary = build_index(&config, &store, &renderer).unwrap();
    assert_eq!(summary.notes_seen, 3);
    assert_eq!(summary.notes_rendered, 3);
    assert_eq!(store.count_notes().unwrap(), 3);

    let traits = store.get_note("rust_traits.md").unwrap().unwrap();
    assert_eq!(traits.title, "Traits");
    assert_eq!(traits.url, "https://cheginit.github.io/til/rust/traits.html");
    assert_eq!(traits.created.as_deref(), Some("2021-03-01T13:00:00+01:00"));
    assert_eq!(traits.created_utc.as_deref(), Some("2021-03-01T12:00:00+00:00"));

    // 3. Full-text search is live after the build
    let hits = store.search("branches", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Rebase");

    // 4. Rewrite the summary document and split per-topic files
    let result = regenerate(&config, &store, true).unwrap();
    let outcome = result.rewrite.unwrap();
    assert!(outcome.index_replaced);
    assert!(outcome.badge_replaced);

    let readme = std::fs::read_to_string(root.join("README.md")).unwrap();
    assert!(readme.contains("count-3-green"));
    assert!(readme.contains("Footer stays put."));
    // Topics appear in order of their first note.
    assert!(readme.find("## Rust").unwrap() < readme.find("## Git").unwrap());
    assert!(readme.contains("* [Traits](https://cheginit.github.io/til/rust/traits.html) - 2021-03-01"));
    assert!(readme.contains("* [Lifetimes](https://cheginit.github.io/til/rust/lifetimes.html) - 2021-03-03"));

    let rust_section = std::fs::read_to_string(root.join("rust/README")).unwrap();
    assert!(rust_section.starts_with("## Rust"));
    assert!(rust_section.contains("[Lifetimes]"));
    assert!(!rust_section.contains("[Rebase]"));
    assert!(root.join("git/README").is_file());

    // 5. A second regeneration with no changes leaves the document as is
    regenerate(&config, &store, true).unwrap();
    assert_eq!(std::fs::read_to_string(root.join("README.md")).unwrap(), readme);

    // 6. Edit one note, commit, rebuild: only that note is re-rendered
    commit(&repo, root, &[("rust/traits.md", "# Traits\n\nShared behaviour, now with generics.\n")], t0 + 5 * day, 0);
    let renderer = recording();
    let summary = build_index(&config, &store, &renderer).unwrap();
    assert_eq!(summary.notes_rendered, 1);
    assert_eq!(summary.notes_unchanged, 2);
    assert_eq!(
        *renderer.calls.lock().unwrap(),
        vec!["Shared behaviour, now with generics.".to_string()]
    );

    let traits = store.get_note("rust_traits.md").unwrap().unwrap();
    assert_eq!(traits.created_utc.as_deref(), Some("2021-03-01T12:00:00+00:00"));
    assert_eq!(traits.updated_utc.as_deref(), Some("2021-03-06T12:00:00+00:00"));
    assert_eq!(store.search("generics", 10).unwrap().len(), 1);
    assert_eq!(store.stats().unwrap().topic_count, 2);
}
