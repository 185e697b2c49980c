//! Filename classification by ordered regex patterns.
//!
//! Each pattern is matched against a full filename (never a path) and must
//! expose a named `title` capture group. Patterns are tried in order and the
//! first one that captures a title wins, so more specific patterns belong
//! earlier in the list.
//!
//! # Built-in patterns
//!
//! 1. Fansub episodes: `[SubsPlease] Series Title - 03v2 (720p) [ABCDEF12].mkv`
//! 2. Movies: `I Want to Eat Your Pancreas (2018) 1080p AV1 Opus [UnAV1Chain] v2.mkv`
//!
//! ```
//! use episort::title_pattern::PatternSet;
//!
//! let patterns = PatternSet::builtin().unwrap();
//! let m = patterns
//!     .match_title("[SubsPlease] Aparida - 09.5 (720p) [F40254DB].mkv")
//!     .unwrap();
//! assert_eq!(m.title, "Aparida");
//! assert_eq!(m.pattern, "episode");
//! ```

use regex::Regex;

/// Name of the capture group every pattern must define.
pub const TITLE_GROUP: &str = "title";

const EPISODE_PATTERN: &str = r"(?x)
    ^\s*
    \[[^\]]+\]              # leading [Group]
    \s+
    (?P<title>.*?)          # series title
    \s*-\s*
    \d+(?:\.\d+)?           # episode: 01 or 09.5
    (?:v\d+)?               # optional version: v2
    (?:\s*\([^)]+\))?       # optional (720p)
    \s*\[[0-9A-Fa-f]+\]     # trailing hash
    \.[A-Za-z0-9]+$         # extension
";

const MOVIE_PATTERN: &str = r"(?x)
    ^\s*
    (?:\[[^\]]+\]\s+)?      # optional leading [Group]
    (?P<title>.+?)\s*       # movie title
    \(\d{4}\)               # (YEAR)
    .*?\.[A-Za-z0-9]+$      # rest + extension
";

/// Errors raised while building a pattern.
#[derive(Debug, Clone)]
pub enum PatternError {
    /// The regex failed to compile.
    InvalidRegex {
        /// Name of the pattern that failed.
        name: String,
        /// The reason reported by the regex engine.
        reason: String,
    },
    /// The regex compiled but has no `title` capture group.
    MissingTitleGroup {
        /// Name of the offending pattern.
        name: String,
    },
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternError::InvalidRegex { name, reason } => {
                write!(f, "Invalid regex for pattern '{}': {}", name, reason)
            }
            PatternError::MissingTitleGroup { name } => {
                write!(
                    f,
                    "Pattern '{}' has no named '{}' capture group",
                    name, TITLE_GROUP
                )
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// A compiled filename pattern with a `title` capture group.
#[derive(Debug, Clone)]
pub struct TitlePattern {
    name: String,
    regex: Regex,
}

impl TitlePattern {
    /// Compiles `pattern` and checks that it defines the `title` group.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::InvalidRegex` if the regex does not compile and
    /// `PatternError::MissingTitleGroup` if it lacks a `title` group.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, PatternError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| PatternError::InvalidRegex {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        if !regex.capture_names().flatten().any(|n| n == TITLE_GROUP) {
            return Err(PatternError::MissingTitleGroup { name });
        }

        Ok(Self { name, regex })
    }

    /// Returns the pattern's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw title captured from `file_name`, if the pattern matches.
    ///
    /// A match where the `title` group did not participate counts as no match.
    pub fn extract(&self, file_name: &str) -> Option<String> {
        self.regex
            .captures(file_name)
            .and_then(|caps| caps.name(TITLE_GROUP))
            .map(|m| m.as_str().to_string())
    }
}

/// The result of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    /// Name of the pattern that matched.
    pub pattern: String,
    /// The title as captured, before sanitization.
    pub title: String,
}

/// An ordered list of patterns; earlier entries take priority.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<TitlePattern>,
}

impl PatternSet {
    /// Creates an empty set. Nothing matches until patterns are pushed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the set of built-in episode and movie patterns.
    ///
    /// # Errors
    ///
    /// Returns an error only if a built-in pattern fails to compile.
    pub fn builtin() -> Result<Self, PatternError> {
        let mut set = Self::new();
        set.push(TitlePattern::new("episode", EPISODE_PATTERN)?);
        set.push(TitlePattern::new("movie", MOVIE_PATTERN)?);
        Ok(set)
    }

    /// Appends a pattern with the lowest priority.
    pub fn push(&mut self, pattern: TitlePattern) {
        self.patterns.push(pattern);
    }

    /// Builder-style variant of [`PatternSet::push`].
    pub fn with(mut self, pattern: TitlePattern) -> Self {
        self.push(pattern);
        self
    }

    /// Number of patterns in the set.
    ///
    /// # Example
    ///
    /// ```
    /// use episort::title_pattern::PatternSet;
    ///
    /// let patterns = PatternSet::builtin().unwrap();
    /// assert_eq!(patterns.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if no pattern was added; such a set matches nothing.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterates the patterns in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &TitlePattern> {
        self.patterns.iter()
    }

    /// Returns the first pattern's title for `file_name`, or `None` if nothing matches.
    pub fn match_title(&self, file_name: &str) -> Option<TitleMatch> {
        self.patterns.iter().find_map(|pattern| {
            pattern.extract(file_name).map(|title| TitleMatch {
                pattern: pattern.name().to_string(),
                title,
            })
        })
    }
}
