//! Path-filter patterns.
//!
//! Three forms are recognised:
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `dir/**` | any path under `dir/` |
//! | contains `*` | whole path, `*` standing for any run of characters (including `/`) |
//! | no `*` | the identical path |
//!
//! Every character other than `*` is literal, so `?`, `[`, `.` and friends in
//! a pattern match only themselves.

use regex::Regex;

const DIRECTORY_SUFFIX: &str = "/**";

/// A compiled path-filter pattern.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Prefix match; holds the directory including its trailing `/`.
    Directory(String),
    /// Anchored wildcard match.
    Wildcard(Regex),
    /// Full-path equality.
    Exact(String),
}

impl PathPattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Fails only if the generated expression exceeds the regex size limit.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        if let Some(dir) = pattern.strip_suffix(DIRECTORY_SUFFIX) {
            return Ok(Self::Directory(format!("{dir}/")));
        }
        if pattern.contains('*') {
            let body = pattern
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            return Regex::new(&format!("^{body}$")).map(Self::Wildcard);
        }
        Ok(Self::Exact(pattern.to_owned()))
    }

    /// Returns `true` if `path` satisfies this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Directory(prefix) => path.starts_with(prefix.as_str()),
            Self::Wildcard(re) => re.is_match(path),
            Self::Exact(expected) => path == expected,
        }
    }
}
