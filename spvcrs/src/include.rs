//! Include handler trait and `#include` expansion

use crate::{Error, FileFinder, Result};
use std::collections::HashMap;

/// Deepest `#include` nesting accepted by [`expand_includes`].
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Include type (local or system)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeType {
    /// Local include (#include "file.glsl")
    Local,
    /// System include (#include <file.glsl>)
    System,
}

/// Trait for custom include file resolution
///
/// # Example
/// ```
/// use spvcrs::{IncludeHandler, IncludeType, Result};
///
/// struct Constants;
///
/// impl IncludeHandler for Constants {
///     fn open(&mut self, _: IncludeType, name: &str) -> Result<String> {
///         Ok(format!("const float {} = 1.0;", name.replace('.', "_")))
///     }
/// }
/// ```
pub trait IncludeHandler {
    /// Returns the text of the include named `name`.
    fn open(&mut self, include_type: IncludeType, name: &str) -> Result<String>;
}

/// Include handler that reads files located through a [`FileFinder`].
///
/// # Example
/// ```no_run
/// use spvcrs::{FileFinder, SearchPathInclude};
///
/// let include = SearchPathInclude::new(
///     FileFinder::new().with_prefix("").with_prefix("shaders/include"),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchPathInclude {
    finder: FileFinder,
}

impl SearchPathInclude {
    /// Creates a handler searching `finder`'s prefixes.
    pub fn new(finder: FileFinder) -> Self {
        SearchPathInclude { finder }
    }

    /// Returns the finder.
    pub fn finder(&self) -> &FileFinder {
        &self.finder
    }

    /// Returns the finder for editing its search path.
    pub fn finder_mut(&mut self) -> &mut FileFinder {
        &mut self.finder
    }
}

impl IncludeHandler for SearchPathInclude {
    fn open(&mut self, _include_type: IncludeType, name: &str) -> Result<String> {
        let path = self
            .finder
            .find_readable_path(name)
            .ok_or_else(|| Error::IncludeNotFound(name.to_string()))?;
        log::trace!("include {name:?} resolved to {path:?}");
        std::fs::read_to_string(&path).map_err(Into::into)
    }
}

/// In-memory include handler for testing or embedded includes.
///
/// # Example
/// ```
/// use spvcrs::MemoryInclude;
///
/// let mut handler = MemoryInclude::new();
/// handler.add("common.glsl", "const vec4 white = vec4(1.0);");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryInclude {
    files: HashMap<String, String>,
}

impl MemoryInclude {
    /// Creates a new empty memory include handler.
    pub fn new() -> Self {
        MemoryInclude {
            files: HashMap::new(),
        }
    }

    /// Adds a file to the handler.
    pub fn add(&mut self, name: &str, contents: &str) {
        self.files.insert(name.to_string(), contents.to_string());
    }

    /// Adds a file (builder pattern).
    pub fn with_file(mut self, name: &str, contents: &str) -> Self {
        self.add(name, contents);
        self
    }
}

impl IncludeHandler for MemoryInclude {
    fn open(&mut self, _include_type: IncludeType, name: &str) -> Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| Error::IncludeNotFound(name.to_string()))
    }
}

/// Replaces every `#include "name"` / `#include <name>` line with the text
/// the handler returns for it, recursively.
///
/// Other lines are kept verbatim. Includes inside `/* */` comments or in
/// branches disabled by a literal `#if 0` / `#elif 0` (or the `#else` of an
/// `#if 1`) are left for the compiler to skip. Other conditions are not
/// evaluated, so their branches are all expanded. Nesting beyond
/// [`MAX_INCLUDE_DEPTH`] is an error; include cycles are not detected beyond
/// that limit.
pub fn expand_includes(source: &str, handler: &mut dyn IncludeHandler) -> Result<String> {
    expand(source, handler, 0)
}

fn expand(source: &str, handler: &mut dyn IncludeHandler, depth: usize) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut scanner = DirectiveScanner::default();
    for line in source.split_inclusive('\n') {
        let Some((include_type, name)) = scanner.live_include(line) else {
            out.push_str(line);
            continue;
        };
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::IncludeDepthExceeded {
                name: name.to_string(),
                limit: MAX_INCLUDE_DEPTH,
            });
        }

        let text = handler.open(include_type, name)?;
        out.push_str(&expand(&text, handler, depth + 1)?);
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

/// Tracks block comments and statically disabled conditional branches
/// across the lines of one file.
#[derive(Debug, Default)]
struct DirectiveScanner {
    in_block_comment: bool,
    conditionals: Vec<Conditional>,
}

#[derive(Debug, Clone, Copy)]
struct Conditional {
    live: bool,
    // A branch known to be taken has been seen; later branches are dead.
    settled: bool,
}

impl DirectiveScanner {
    /// Feeds one line and returns the include it names, if that include is
    /// neither commented out nor in a disabled branch.
    fn live_include<'l>(&mut self, line: &'l str) -> Option<(IncludeType, &'l str)> {
        let starts_in_comment = self.in_block_comment;
        self.in_block_comment = ends_in_block_comment(line, starts_in_comment);
        if starts_in_comment {
            return None;
        }

        let directive = line.trim().strip_prefix('#')?.trim_start();
        let keyword_len = directive
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(directive.len());
        let (keyword, condition) = directive.split_at(keyword_len);
        let condition = literal_condition(condition);

        match keyword {
            "include" if self.is_live() => return parse_include(line),
            "if" => self.conditionals.push(Conditional {
                live: condition != Some(false),
                settled: condition == Some(true),
            }),
            "ifdef" | "ifndef" => self.conditionals.push(Conditional {
                live: true,
                settled: false,
            }),
            "elif" | "else" => {
                if let Some(frame) = self.conditionals.last_mut() {
                    let condition = if keyword == "else" { Some(true) } else { condition };
                    frame.live = !frame.settled && condition != Some(false);
                    frame.settled |= frame.live && condition == Some(true);
                }
            }
            "endif" => {
                self.conditionals.pop();
            }
            _ => {}
        }
        None
    }

    fn is_live(&self) -> bool {
        self.conditionals.iter().all(|frame| frame.live)
    }
}

fn literal_condition(condition: &str) -> Option<bool> {
    let condition = condition.split("//").next().unwrap_or_default().trim();
    match condition {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

/// Returns whether a `/* */` comment is still open at the end of `line`.
fn ends_in_block_comment(line: &str, mut in_comment: bool) -> bool {
    let mut rest = line;
    loop {
        if in_comment {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    in_comment = false;
                }
                None => return true,
            }
        } else {
            match (rest.find("/*"), rest.find("//")) {
                (Some(open), Some(line_comment)) if line_comment < open => return false,
                (Some(open), _) => {
                    rest = &rest[open + 2..];
                    in_comment = true;
                }
                (None, _) => return false,
            }
        }
    }
}

fn parse_include(line: &str) -> Option<(IncludeType, &str)> {
    let rest = line.trim().strip_prefix('#')?.trim_start();
    let target = rest.strip_prefix("include")?.trim();
    if let Some(name) = target.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some((IncludeType::Local, name))
    } else {
        let name = target.strip_prefix('<')?.strip_suffix('>')?;
        Some((IncludeType::System, name))
    }
    .filter(|(_, name)| !name.is_empty())
}
