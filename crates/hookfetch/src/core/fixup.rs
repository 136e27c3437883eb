use std::path::{Path, PathBuf};

use url::Url;

/// A single URI rewrite. Fixers never fail: a URI they cannot improve comes
/// back untouched.
pub type Fixer = fn(&str, &FixupContext) -> String;

/// Where relative `file:` URIs are resolved from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkingDir {
    /// The process working directory, read at dispatch time.
    #[default]
    Process,
    /// A fixed directory.
    Fixed(PathBuf),
}

impl WorkingDir {
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            WorkingDir::Process => std::env::current_dir().ok(),
            WorkingDir::Fixed(path) => Some(path.clone()),
        }
    }
}

/// Ambient state fixers may consult, captured once per dispatch.
#[derive(Debug, Clone, Default)]
pub struct FixupContext {
    cwd: Option<PathBuf>,
}

impl FixupContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self { Self { cwd: Some(cwd.into()) } }

    pub fn from_working_dir(dir: &WorkingDir) -> Self { Self { cwd: dir.resolve() } }

    pub fn cwd(&self) -> Option<&Path> { self.cwd.as_deref() }
}

/// Ordered list of fixers applied to string inputs before they are parsed.
///
/// Every fixer runs, each on the output of the previous one.
///
/// # Examples
///
/// ```
/// use hookfetch::core::{FixupContext, UriFixups};
///
/// let fixups = UriFixups::default();
/// let ctx = FixupContext::new("/srv/data");
/// assert_eq!(fixups.apply("file:smiley.txt", &ctx), "file:///srv/data/smiley.txt");
/// assert_eq!(fixups.apply("https://example.com", &ctx), "https://example.com");
/// ```
#[derive(Clone)]
pub struct UriFixups {
    fixers: Vec<Fixer>,
}

impl Default for UriFixups {
    fn default() -> Self {
        Self {
            fixers: vec![resolve_relative_file as Fixer],
        }
    }
}

impl UriFixups {
    /// No fixers at all.
    pub fn empty() -> Self { Self { fixers: Vec::new() } }

    /// Append `fixer` after the existing ones.
    pub fn with(mut self, fixer: Fixer) -> Self {
        self.fixers.push(fixer);
        self
    }

    pub fn len(&self) -> usize { self.fixers.len() }

    pub fn is_empty(&self) -> bool { self.fixers.is_empty() }

    pub fn apply(&self, url: &str, ctx: &FixupContext) -> String {
        self.fixers
            .iter()
            .fold(url.to_owned(), |url, fixer| fixer(&url, ctx))
    }
}

impl std::fmt::Debug for UriFixups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UriFixups")
            .field("fixers", &self.fixers.len())
            .finish()
    }
}

/// Resolve an authority-less relative `file:` URI against the working
/// directory, e.g. `file:data/a.txt` to `file:///cwd/data/a.txt`.
///
/// URIs with an authority (`file://…`) or an absolute path (`file:/…`) pass
/// through, as does everything when there is no usable working directory.
pub fn resolve_relative_file(url: &str, ctx: &FixupContext) -> String {
    let Some(scheme) = url.get(..5) else {
        return url.to_owned();
    };
    if !scheme.eq_ignore_ascii_case("file:") {
        return url.to_owned();
    }

    let rest = &url[5..];
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
        return url.to_owned();
    }

    let Some(base) = ctx.cwd().and_then(|cwd| Url::from_directory_path(cwd).ok()) else {
        return url.to_owned();
    };

    // "./" keeps a leading "c:" from being read as a scheme
    match base.join(&format!("./{rest}")) {
        Ok(resolved) => resolved.into(),
        Err(_) => url.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FixupContext { FixupContext::new("/base/dir") }

    #[test]
    fn test_relative_file_is_resolved() {
        assert_eq!(resolve_relative_file("file:smiley.txt", &ctx()), "file:///base/dir/smiley.txt");
    }

    #[test]
    fn test_relative_file_with_dot_segments() {
        assert_eq!(
            resolve_relative_file("file:../other/./a.txt", &ctx()),
            "file:///base/other/a.txt"
        );
    }

    #[test]
    fn test_relative_file_keeps_query_and_fragment() {
        assert_eq!(
            resolve_relative_file("file:a.txt?x=1#top", &ctx()),
            "file:///base/dir/a.txt?x=1#top"
        );
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(resolve_relative_file("FILE:a.txt", &ctx()), "file:///base/dir/a.txt");
    }

    #[test]
    fn test_absolute_and_authority_uris_pass_through() {
        for url in [
            "file:///etc/hosts",
            "file:/etc/hosts",
            "file://host/share/a.txt",
            "file:",
            "https://example.com/a",
            "data:,hello",
            "fil",
        ] {
            assert_eq!(resolve_relative_file(url, &ctx()), url, "{url} should pass through");
        }
    }

    #[test]
    fn test_no_working_directory_passes_through() {
        let ctx = FixupContext::default();
        assert_eq!(resolve_relative_file("file:a.txt", &ctx), "file:a.txt");
    }

    #[test]
    fn test_relative_working_directory_passes_through() {
        let ctx = FixupContext::new("relative/dir");
        assert_eq!(resolve_relative_file("file:a.txt", &ctx), "file:a.txt");
    }

    #[test]
    fn test_fixers_are_cumulative() {
        fn shout(url: &str, _: &FixupContext) -> String { url.replace("smiley", "SMILEY") }

        let fixups = UriFixups::default().with(shout);
        assert_eq!(fixups.len(), 2);
        assert_eq!(fixups.apply("file:smiley.txt", &ctx()), "file:///base/dir/SMILEY.txt");
    }

    #[test]
    fn test_empty_fixups_are_identity() {
        let fixups = UriFixups::empty();
        assert!(fixups.is_empty());
        assert_eq!(fixups.apply("file:a.txt", &ctx()), "file:a.txt");
    }

    #[test]
    fn test_fixed_working_dir_resolves() {
        let dir = WorkingDir::Fixed(PathBuf::from("/srv"));
        assert_eq!(dir.resolve(), Some(PathBuf::from("/srv")));
        assert_eq!(FixupContext::from_working_dir(&dir).cwd(), Some(Path::new("/srv")));
    }
}
