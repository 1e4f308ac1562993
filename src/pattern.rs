use glob::{MatchOptions, Pattern};

use crate::error::Error;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// One compiled include/exclude specification. Wildcards are `*` (any run
/// of characters) and `?` (one character); matching is case-insensitive and
/// anchored to match anywhere in the name ending at string end, so
/// `Temp*.*` matches `TempData.zip` and `MyTempData.zip` alike.
#[derive(Debug, Clone)]
pub struct FilePattern {
    spec: String,
    pattern: Pattern,
}

impl FilePattern {
    pub fn new(spec: &str) -> Result<Self, Error> {
        // A leading * gives the match-anywhere semantics; the tail is
        // anchored because glob patterns always match the whole string.
        let anchored = if spec.starts_with('*') {
            spec.to_string()
        } else {
            format!("*{}", spec)
        };
        let pattern = Pattern::new(&anchored).map_err(|source| Error::Pattern {
            spec: spec.to_string(),
            source,
        })?;
        Ok(Self {
            spec: spec.to_string(),
            pattern,
        })
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches_with(file_name, MATCH_OPTIONS)
    }
}

pub fn compile_patterns(specs: &[String]) -> Result<Vec<FilePattern>, Error> {
    specs.iter().map(|spec| FilePattern::new(spec)).collect()
}

/// Include/exclude precedence: with no include patterns everything is
/// included by default; any exclude match vetoes regardless of the include
/// result.
pub fn selects(file_name: &str, includes: &[FilePattern], excludes: &[FilePattern]) -> bool {
    let included = includes.is_empty() || includes.iter().any(|p| p.matches(file_name));
    included && !excludes.iter().any(|p| p.matches(file_name))
}
