use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};

/// In-memory genre word lists, keyed by genre label. All words are hiragana.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct GenreDictionary {
    genres: HashMap<String, HashSet<String>>,
}

impl GenreDictionary {
    /// The built-in genre lists shipped with the server.
    pub fn builtin() -> Self {
        let mut genres = HashMap::new();
        genres.insert(
            "食べ物".to_string(),
            parse_word_list(include_str!("../words/tabemono.txt")),
        );
        genres.insert(
            "動物".to_string(),
            parse_word_list(include_str!("../words/doubutsu.txt")),
        );
        Self { genres }
    }

    /// Loads genre lists from a directory: every `.txt` file becomes a genre
    /// named after the file stem, one hiragana word per line.
    pub fn from_dir<P: AsRef<Path>>(dir_path: P) -> Result<Self> {
        let dir = dir_path.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!("not a genre directory: {}", dir.display()));
        }

        let mut genres = HashMap::new();
        for entry in
            fs::read_dir(dir).map_err(|e| anyhow!("read dir {}: {}", dir.display(), e))?
        {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("txt") {
                continue;
            }
            let label = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let content =
                fs::read_to_string(&path).map_err(|e| anyhow!("read {}: {}", path.display(), e))?;
            genres.insert(label, parse_word_list(&content));
        }

        if genres.is_empty() {
            return Err(anyhow!("no genre word lists in {}", dir.display()));
        }
        Ok(Self { genres })
    }

    /// Builds a dictionary from inline lists. Test helper.
    pub fn from_lists(lists: &[(&str, &str)]) -> Self {
        let genres = lists
            .iter()
            .map(|(label, words)| (label.to_string(), parse_word_list(words)))
            .collect();
        Self { genres }
    }

    /// Checks if a word (in hiragana) belongs to the given genre.
    /// An empty genre, `なし`, or an unknown genre accepts any word.
    pub fn contains(&self, hiragana_word: &str, genre: &str) -> bool {
        if genre.is_empty() || genre == "なし" {
            return true;
        }
        match self.genres.get(genre) {
            Some(words) => words.contains(hiragana_word),
            None => true,
        }
    }
}

fn parse_word_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
