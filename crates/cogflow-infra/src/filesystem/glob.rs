//! Filename patterns: a directory plus a file name containing `*` and `?`.
//!
//! Wildcards only apply to the final path component. `*` matches any run of
//! characters and `?` matches exactly one. Hidden files are only matched when
//! the pattern itself starts with a dot.

use std::path::{Path, PathBuf};

use regex::Regex;

/// Compile a file-name pattern into an anchored regex.
pub fn pattern_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for c in pattern.chars() {
        match c {
            '*' => source.push_str("[^/]*"),
            '?' => source.push_str("[^/]"),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source)
}

/// Whether a pattern contains any wildcard.
pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// All regular files matching `pattern`, sorted by path.
///
/// A missing directory yields no matches.
pub async fn expand(pattern: &str) -> Result<Vec<PathBuf>, GlobError> {
    let path = Path::new(pattern);
    let Some(file_pattern) = path.file_name().and_then(|n| n.to_str()) else {
        return Err(GlobError::NoFileName(pattern.to_string()));
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !has_wildcard(file_pattern) {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        return Ok(if is_file { vec![path.to_path_buf()] } else { Vec::new() });
    }

    let matcher = pattern_regex(file_pattern)?;
    let include_hidden = file_pattern.starts_with('.');

    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "pattern directory does not exist");
            return Ok(Vec::new());
        }
        Err(source) => return Err(GlobError::Io { dir, source }),
    };

    let mut matches = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => return Err(GlobError::Io { dir, source }),
        };
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with('.') && !include_hidden {
            continue;
        }
        if !matcher.is_match(name) {
            continue;
        }
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            matches.push(dir.join(name));
        }
    }

    matches.sort();
    Ok(matches)
}

/// Errors from expanding a pattern.
#[derive(Debug, thiserror::Error)]
pub enum GlobError {
    #[error("pattern '{0}' has no file name component")]
    NoFileName(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to list {}: {source}", .dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pattern_regex() {
        let re = pattern_regex("*.txt").unwrap();
        assert!(re.is_match("notes.txt"));
        assert!(!re.is_match("notes.txt.bak"));
        assert!(!re.is_match("notes.md"));

        let re = pattern_regex("part-?.md").unwrap();
        assert!(re.is_match("part-1.md"));
        assert!(!re.is_match("part-12.md"));

        // Regex metacharacters in the pattern are literal.
        let re = pattern_regex("a+b(1).txt").unwrap();
        assert!(re.is_match("a+b(1).txt"));
        assert!(!re.is_match("aab1.txt"));
    }

    #[tokio::test]
    async fn test_expand_sorted_files_only() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("c.md"), "c").unwrap();
        std::fs::write(dir.path().join(".hidden.txt"), "h").unwrap();
        std::fs::create_dir(dir.path().join("dir.txt")).unwrap();

        let pattern = dir.path().join("*.txt");
        let found = expand(pattern.to_str().unwrap()).await.unwrap();

        assert_eq!(found, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);
    }

    #[tokio::test]
    async fn test_expand_literal_and_missing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("one.txt"), "1").unwrap();

        let literal = dir.path().join("one.txt");
        assert_eq!(expand(literal.to_str().unwrap()).await.unwrap(), vec![literal.clone()]);

        let missing_dir = dir.path().join("nope").join("*.txt");
        assert!(expand(missing_dir.to_str().unwrap()).await.unwrap().is_empty());
    }
}
