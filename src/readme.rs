use crate::error::{ArchiveError, Result};
use crate::model::{Difficulty, SummaryEntry};
use askama::Template;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const INDEX_FILE: &str = "README.md";

#[derive(Debug, Default, Template)]
#[template(path = "readme.md.j2", escape = "none")]
pub struct IndexPage<'a> {
    pub total: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub languages: String,
    pub entries: Vec<&'a SummaryEntry>,
}

impl<'a> IndexPage<'a> {
    /// Entries are listed by title; row numbers follow that order.
    pub fn new(summary: &'a [SummaryEntry], languages: &[String]) -> Self {
        let mut page = IndexPage {
            total: summary.len(),
            languages: languages.join(", "),
            ..Default::default()
        };
        for entry in summary {
            match entry.difficulty {
                Difficulty::Easy => page.easy += 1,
                Difficulty::Medium => page.medium += 1,
                Difficulty::Hard => page.hard += 1,
            }
        }
        page.entries = summary.iter().collect();
        page.entries.sort_by(|a, b| a.title.cmp(&b.title));
        page
    }
}

pub fn render_index(summary: &[SummaryEntry], languages: &[String]) -> Result<String> {
    Ok(IndexPage::new(summary, languages).render()?)
}

/// Write `<base_dir>/README.md`, creating `base_dir` when nothing was archived yet.
pub async fn write_index(
    base_dir: &Path,
    summary: &[SummaryEntry],
    languages: &[String],
) -> Result<PathBuf> {
    let content = render_index(summary, languages)?;
    fs::create_dir_all(base_dir)
        .await
        .map_err(|e| ArchiveError::fs(base_dir, e))?;
    let path = base_dir.join(INDEX_FILE);
    fs::write(&path, content)
        .await
        .map_err(|e| ArchiveError::fs(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(slug: &str, title: &str, difficulty: Difficulty) -> SummaryEntry {
        SummaryEntry {
            slug: slug.into(),
            title: title.into(),
            difficulty,
        }
    }

    #[test]
    fn index_is_sorted_by_title_with_counts() {
        let summary = vec![
            entry("two-sum", "Two Sum", Difficulty::Easy),
            entry("add-two-numbers", "Add Two Numbers", Difficulty::Medium),
            entry("median-of-two-sorted-arrays", "Median of Two Sorted Arrays", Difficulty::Hard),
            entry("3sum", "3Sum", Difficulty::Medium),
        ];
        let languages = vec!["python3".to_string(), "cpp".to_string()];

        insta::assert_snapshot!(render_index(&summary, &languages).unwrap(), @r###"
        leetcode
        ========
        #### Total solved: 4 (Easy: 1 Medium: 2 Hard: 1)
        My solutions of [leetcode](https://leetcode.com/problemset/all/)

        Languages: python3, cpp

        | No | Title | Source Code | Difficulty |
        |----|-------|-------------|------------|
        | 1 | 3Sum | [Link](./3sum) | Medium |
        | 2 | Add Two Numbers | [Link](./add-two-numbers) | Medium |
        | 3 | Median of Two Sorted Arrays | [Link](./median-of-two-sorted-arrays) | Hard |
        | 4 | Two Sum | [Link](./two-sum) | Easy |
        "###);
    }

    #[test]
    fn empty_summary_still_renders_header() {
        let out = render_index(&[], &["python3".to_string()]).unwrap();

        assert!(out.contains("#### Total solved: 0 (Easy: 0 Medium: 0 Hard: 0)"));
        assert!(out.ends_with("|----|-------|-------------|------------|\n"));
    }

    #[test]
    fn titles_are_not_html_escaped() {
        let summary = vec![entry("a-b", "A & B <C>", Difficulty::Easy)];
        let out = render_index(&summary, &["python3".to_string()]).unwrap();
        assert!(out.contains("| 1 | A & B <C> | [Link](./a-b) | Easy |"));
    }

    #[tokio::test]
    async fn write_index_creates_the_output_directory() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("leetcode");
        let summary = vec![entry("two-sum", "Two Sum", Difficulty::Easy)];

        let path = write_index(&base, &summary, &["python3".to_string()])
            .await
            .unwrap();

        assert_eq!(path, base.join("README.md"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("| 1 | Two Sum | [Link](./two-sum) | Easy |"));
    }
}
