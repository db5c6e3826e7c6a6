//! File-type classification by extension and special basename

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Coarse file category driving chunking strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Code,
    Document,
    Config,
    Data,
    Binary,
    Unknown,
}

impl FileType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Document => "document",
            Self::Config => "config",
            Self::Data => "data",
            Self::Binary => "binary",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    /// Extension -> (type, language tag). Language tags match the
    /// chunker's registry where a tree-sitter grammar exists.
    static ref FILE_TYPE_MAPPING: HashMap<&'static str, (FileType, Option<&'static str>)> = {
        let mut m = HashMap::new();
        // Code
        m.insert(".py", (FileType::Code, Some("python")));
        m.insert(".pyi", (FileType::Code, Some("python")));
        m.insert(".js", (FileType::Code, Some("javascript")));
        m.insert(".jsx", (FileType::Code, Some("javascript")));
        m.insert(".mjs", (FileType::Code, Some("javascript")));
        m.insert(".ts", (FileType::Code, Some("typescript")));
        m.insert(".tsx", (FileType::Code, Some("typescript")));
        m.insert(".java", (FileType::Code, Some("java")));
        m.insert(".cpp", (FileType::Code, Some("cpp")));
        m.insert(".cxx", (FileType::Code, Some("cpp")));
        m.insert(".cc", (FileType::Code, Some("cpp")));
        m.insert(".hpp", (FileType::Code, Some("cpp")));
        m.insert(".c", (FileType::Code, Some("cpp")));
        m.insert(".h", (FileType::Code, Some("cpp")));
        m.insert(".cs", (FileType::Code, Some("csharp")));
        m.insert(".go", (FileType::Code, Some("go")));
        m.insert(".rs", (FileType::Code, Some("rust")));
        m.insert(".php", (FileType::Code, Some("php")));
        m.insert(".rb", (FileType::Code, Some("ruby")));
        m.insert(".swift", (FileType::Code, Some("swift")));
        m.insert(".kt", (FileType::Code, Some("kotlin")));
        m.insert(".scala", (FileType::Code, Some("scala")));
        m.insert(".clj", (FileType::Code, None));
        m.insert(".sh", (FileType::Code, Some("shell")));
        m.insert(".sql", (FileType::Code, Some("sql")));
        m.insert(".html", (FileType::Code, Some("html")));
        m.insert(".css", (FileType::Code, Some("css")));
        m.insert(".vue", (FileType::Code, Some("javascript")));
        // Documents
        m.insert(".md", (FileType::Document, Some("markdown")));
        m.insert(".txt", (FileType::Document, None));
        m.insert(".rst", (FileType::Document, None));
        m.insert(".tex", (FileType::Document, None));
        m.insert(".adoc", (FileType::Document, None));
        // Config
        m.insert(".json", (FileType::Config, None));
        m.insert(".yaml", (FileType::Config, None));
        m.insert(".yml", (FileType::Config, None));
        m.insert(".toml", (FileType::Config, None));
        m.insert(".ini", (FileType::Config, None));
        m.insert(".cfg", (FileType::Config, None));
        m.insert(".conf", (FileType::Config, None));
        m.insert(".env", (FileType::Config, None));
        m.insert(".xml", (FileType::Config, None));
        m.insert(".gitignore", (FileType::Config, None));
        m.insert(".gitattributes", (FileType::Config, None));
        // Data
        m.insert(".csv", (FileType::Data, None));
        m.insert(".tsv", (FileType::Data, None));
        m
    };

    /// Extension-less special basenames (prefix-matched, lowercase)
    static ref SPECIAL_BASENAMES: Vec<(&'static str, (FileType, Option<&'static str>))> = vec![
        ("dockerfile", (FileType::Config, None)),
        ("makefile", (FileType::Config, None)),
        ("readme", (FileType::Document, None)),
        ("license", (FileType::Document, None)),
        ("changelog", (FileType::Document, None)),
    ];

    /// Hard exclusion set: never emitted by the scanner
    static ref BINARY_EXTENSIONS: HashSet<&'static str> = [
        ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
        ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico",
        ".mp3", ".mp4", ".avi", ".mov", ".wav", ".zip", ".tar", ".gz",
        ".exe", ".dll", ".so", ".dylib", ".jar", ".class", ".pyc",
        ".o", ".obj", ".lib", ".a", ".bin", ".dat", ".woff", ".woff2",
        ".ttf", ".eot",
    ]
    .into_iter()
    .collect();
}

/// Lowercased extension with the leading dot, e.g. `.rs`
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Whether the extension is in the hard binary exclusion set
pub fn is_binary_extension(extension: &str) -> bool {
    BINARY_EXTENSIONS.contains(extension)
}

/// Classify a path into (type, language) by extension, then special
/// basename prefix; everything else is `Unknown`.
pub fn classify(path: &Path) -> (FileType, Option<&'static str>) {
    if let Some(ext) = extension_of(path) {
        if let Some(&(file_type, language)) = FILE_TYPE_MAPPING.get(ext.as_str()) {
            return (file_type, language);
        }
    }

    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    for (name, classification) in SPECIAL_BASENAMES.iter() {
        if basename.starts_with(name) {
            return *classification;
        }
    }

    (FileType::Unknown, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(Path::new("src/main.rs")), (FileType::Code, Some("rust")));
        assert_eq!(
            classify(Path::new("docs/guide.md")),
            (FileType::Document, Some("markdown"))
        );
        assert_eq!(classify(Path::new("config.yaml")), (FileType::Config, None));
    }

    #[test]
    fn classifies_special_basenames() {
        assert_eq!(classify(Path::new("Dockerfile")), (FileType::Config, None));
        assert_eq!(classify(Path::new("README")), (FileType::Document, None));
        assert_eq!(
            classify(Path::new("Makefile.am")),
            (FileType::Config, None)
        );
    }

    #[test]
    fn unknown_extensions_are_unknown() {
        assert_eq!(classify(Path::new("weights.xyzq")), (FileType::Unknown, None));
    }

    #[test]
    fn binary_extensions_are_flagged() {
        assert!(is_binary_extension(".png"));
        assert!(is_binary_extension(".so"));
        assert!(!is_binary_extension(".rs"));
    }
}
