//! Search-path file lookup

use std::fs::File;

/// Finds readable files by trying each prefix of a search path in turn.
///
/// Prefixes are joined textually: an empty prefix tries the filename as-is,
/// a prefix not ending in a separator gets a `/` inserted, and absolute
/// filenames are prefixed like any other (`"."` + `"/a/b"` gives
/// `".//a/b"`). An empty search path finds nothing, so put `""` first to
/// make plain relative and absolute names resolve.
///
/// # Example
/// ```no_run
/// use spvcrs::FileFinder;
///
/// let finder = FileFinder::new().with_prefix("").with_prefix("shaders");
/// if let Some(path) = finder.find_readable_path("common.glsl") {
///     println!("found {path}");
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFinder {
    search_path: Vec<String>,
}

impl FileFinder {
    /// Creates a finder with an empty search path.
    pub fn new() -> Self {
        FileFinder {
            search_path: Vec::new(),
        }
    }

    /// Appends a prefix (builder pattern).
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.search_path.push(prefix.into());
        self
    }

    /// Returns the search path in lookup order.
    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// Returns the search path for editing between lookups.
    pub fn search_path_mut(&mut self) -> &mut Vec<String> {
        &mut self.search_path
    }

    /// Returns the first candidate path that opens for reading.
    ///
    /// `filename` must be non-empty. A miss is `None`, not an error.
    pub fn find_readable_path(&self, filename: &str) -> Option<String> {
        debug_assert!(!filename.is_empty(), "filename must be non-empty");
        if filename.is_empty() {
            return None;
        }

        self.search_path
            .iter()
            .map(|prefix| candidate(prefix, filename))
            .find(|path| File::open(path).is_ok())
    }
}

impl<S: Into<String>> FromIterator<S> for FileFinder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FileFinder {
            search_path: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn candidate(prefix: &str, filename: &str) -> String {
    match prefix.chars().last() {
        None => filename.to_string(),
        Some(last) if std::path::is_separator(last) => format!("{prefix}{filename}"),
        Some(_) => format!("{prefix}/{filename}"),
    }
}
