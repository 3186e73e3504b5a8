use glob::Pattern;
use std::ffi::OsStr;

/// Base-name globs that are never staged, at any directory depth.
pub const DEFAULT_EXCLUDES: [&str; 3] = ["__init__.py", "*_test.py", "*.md"];

/// Compiled exclusion patterns, matched against an entry's base name only.
///
/// A matching directory is pruned together with everything beneath it.
#[derive(Debug, Clone)]
pub struct ExclusionPatterns {
    patterns: Vec<Pattern>,
}

impl ExclusionPatterns {
    pub fn new<I, S>(globs: I) -> Result<Self, glob::PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = globs
            .into_iter()
            .map(|g| Pattern::new(g.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        self.patterns.iter().any(|p| p.matches(&name))
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }
}

impl Default for ExclusionPatterns {
    fn default() -> Self {
        let patterns = DEFAULT_EXCLUDES
            .iter()
            .filter_map(|g| Pattern::new(g).ok())
            .collect();
        Self { patterns }
    }
}
