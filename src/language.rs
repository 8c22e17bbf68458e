//! Extension based language classification.
//!
//! One process-wide table backs every caller: the history walker, the
//! working-tree snapshot and the per-contributor breakdown all resolve labels
//! through [`classify`], so identical paths always land in the same bucket.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Label used for files whose extension is unknown or missing.
pub const OTHER: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    pub name: &'static str,
    /// Whether files of this language count as source code.
    pub code: bool,
}

impl Language {
    const fn code(name: &'static str) -> Self {
        Self { name, code: true }
    }

    const fn text(name: &'static str) -> Self {
        Self { name, code: false }
    }

    pub fn is_other(&self) -> bool {
        self.name == OTHER
    }
}

const FALLBACK: Language = Language::text(OTHER);

const TABLE: &[(&str, Language)] = &[
    ("py", Language::code("Python")),
    ("pyi", Language::code("Python")),
    ("js", Language::code("JavaScript")),
    ("jsx", Language::code("JavaScript")),
    ("mjs", Language::code("JavaScript")),
    ("cjs", Language::code("JavaScript")),
    ("ts", Language::code("TypeScript")),
    ("tsx", Language::code("TypeScript")),
    ("java", Language::code("Java")),
    ("cpp", Language::code("C++")),
    ("cc", Language::code("C++")),
    ("cxx", Language::code("C++")),
    ("hpp", Language::code("C++")),
    ("c", Language::code("C")),
    ("h", Language::code("C/C++")),
    ("cs", Language::code("C#")),
    ("rb", Language::code("Ruby")),
    ("php", Language::code("PHP")),
    ("go", Language::code("Go")),
    ("rs", Language::code("Rust")),
    ("swift", Language::code("Swift")),
    ("kt", Language::code("Kotlin")),
    ("kts", Language::code("Kotlin")),
    ("scala", Language::code("Scala")),
    ("r", Language::code("R")),
    ("m", Language::code("MATLAB")),
    ("sh", Language::code("Shell")),
    ("bash", Language::code("Shell")),
    ("zsh", Language::code("Shell")),
    ("sql", Language::code("SQL")),
    ("html", Language::code("HTML")),
    ("htm", Language::code("HTML")),
    ("css", Language::code("CSS")),
    ("scss", Language::code("SCSS")),
    ("sass", Language::code("SASS")),
    ("less", Language::code("LESS")),
    ("dockerfile", Language::code("Dockerfile")),
    ("md", Language::text("Markdown")),
    ("rst", Language::text("reStructuredText")),
    ("tex", Language::text("TeX")),
    ("latex", Language::text("LaTeX")),
    ("bib", Language::text("BibTeX")),
    ("txt", Language::text("Text")),
    ("json", Language::text("JSON")),
    ("yaml", Language::text("YAML")),
    ("yml", Language::text("YAML")),
    ("xml", Language::text("XML")),
    ("toml", Language::text("TOML")),
    ("ini", Language::text("INI")),
    ("cfg", Language::text("INI")),
    ("conf", Language::text("INI")),
    ("csv", Language::text("CSV")),
    ("tsv", Language::text("TSV")),
    ("diff", Language::text("Diff")),
    ("patch", Language::text("Diff")),
    ("properties", Language::text("Properties")),
];

static EXTENSIONS: LazyLock<HashMap<&'static str, Language>> =
    LazyLock::new(|| TABLE.iter().copied().collect());

/// Map a path to its language. Total over all inputs; unknown or missing
/// extensions map to [`OTHER`].
pub fn classify(path: &str) -> Language {
    let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
        return FALLBACK;
    };
    EXTENSIONS
        .get(ext.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(FALLBACK)
}
