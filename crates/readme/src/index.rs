use til_types::NoteRecord;

pub const INDEX_START: &str = "<!-- index starts -->";
pub const INDEX_END: &str = "<!-- index ends -->";

/// Uppercase the first cased letter of every word and lowercase the rest,
/// where a word is a run of letters (`"python3x"` becomes `"Python3X"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_alphabetic();
    }
    out
}

/// `github_actions` -> `Github Actions`.
pub fn topic_heading(topic: &str) -> String {
    title_case(&topic.replace('_', " "))
}

/// Group notes by topic, keeping the order in which each topic first
/// appears in `notes`.
pub fn group_by_topic(notes: &[NoteRecord]) -> Vec<(&str, Vec<&NoteRecord>)> {
    let mut groups: Vec<(&str, Vec<&NoteRecord>)> = Vec::new();
    for note in notes {
        match groups.iter_mut().find(|(topic, _)| *topic == note.topic) {
            Some((_, members)) => members.push(note),
            None => groups.push((note.topic.as_str(), vec![note])),
        }
    }
    groups
}

/// The marker-bounded summary block for `notes`, which must already be in
/// ascending creation order.
pub fn build_index(notes: &[NoteRecord]) -> String {
    let mut lines: Vec<String> = vec![INDEX_START.to_string()];
    for (topic, members) in group_by_topic(notes) {
        lines.push(format!("## {}\n", topic_heading(topic)));
        for note in members {
            lines.push(match note.created_date() {
                Some(date) => format!("* [{}]({}) - {}", note.title, note.url, date),
                None => format!("* [{}]({})", note.title, note.url),
            });
        }
        lines.push(String::new());
    }
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.push(INDEX_END.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(topic: &str, slug: &str, created: &str) -> NoteRecord {
        NoteRecord {
            path: format!("{}_{}.md", topic, slug),
            slug: slug.into(),
            topic: topic.into(),
            title: format!("Title {}", slug),
            url: format!("https://example.com/{}/{}.html", topic, slug),
            body: String::new(),
            html: None,
            created: Some(created.into()),
            created_utc: Some(created.into()),
            updated: None,
            updated_utc: None,
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("github actions"), "Github Actions");
        assert_eq!(title_case("RUST"), "Rust");
        assert_eq!(title_case("python3x"), "Python3X");
        assert_eq!(title_case("it's"), "It'S");
        assert_eq!(topic_heading("github_actions"), "Github Actions");
    }

    #[test]
    fn test_build_index_exact_layout() {
        let notes = vec![
            note("rust", "a", "2020-01-01T10:00:00+01:00"),
            note("git", "b", "2020-02-01T10:00:00+00:00"),
            note("rust", "c", "2020-03-01T10:00:00-05:00"),
        ];
        let expected = "<!-- index starts -->\n\
## Rust\n\
\n\
* [Title a](https://example.com/rust/a.html) - 2020-01-01\n\
* [Title c](https://example.com/rust/c.html) - 2020-03-01\n\
\n\
## Git\n\
\n\
* [Title b](https://example.com/git/b.html) - 2020-02-01\n\
<!-- index ends -->";
        assert_eq!(build_index(&notes), expected);
    }

    #[test]
    fn test_build_index_counts_headings_and_bullets() {
        let topics = ["rust", "git", "python", "shell"];
        let mut notes = Vec::new();
        for day in 0..3 {
            for (i, topic) in topics.iter().enumerate() {
                notes.push(note(topic, &format!("n{}{}", day, i), &format!("2021-01-{:02}T00:00:0{}+00:00", day + 1, i)));
            }
        }
        let index = build_index(&notes);
        let headings: Vec<&str> = index.lines().filter(|l| l.starts_with("## ")).collect();
        assert_eq!(headings, vec!["## Rust", "## Git", "## Python", "## Shell"]);
        assert_eq!(index.lines().filter(|l| l.starts_with("* [")).count(), 12);

        // Within a topic bullets follow the input (time) order.
        let rust_section: Vec<&str> = index
            .lines()
            .skip_while(|l| *l != "## Rust")
            .take_while(|l| *l != "## Git")
            .filter(|l| l.starts_with("* ["))
            .collect();
        assert!(rust_section[0].contains("/rust/n00.html"));
        assert!(rust_section[2].contains("/rust/n20.html"));
    }

    #[test]
    fn test_build_index_empty() {
        assert_eq!(build_index(&[]), format!("{}\n{}", INDEX_START, INDEX_END));
    }
}
