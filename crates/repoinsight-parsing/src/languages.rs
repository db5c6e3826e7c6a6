//! Language registry for the syntax-aware chunker
//!
//! Each supported language declares its tree-sitter grammar, the node
//! kinds extracted as elements, and the container/body kinds used when
//! decomposing oversize classes.

use lazy_static::lazy_static;
use std::collections::HashMap;
use tree_sitter::Language;

/// Categories an extracted element can fall into, ordered by merge
/// priority (imports merge most eagerly, classes least)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Import,
    Assignment,
    Function,
    DecoratedDefinition,
    Class,
}

impl ElementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Assignment => "assignment",
            Self::Function => "function",
            Self::DecoratedDefinition => "decorated_definition",
            Self::Class => "class",
        }
    }

    /// Merge priority: import < assignment < function ≈ decorated < class
    pub const fn merge_priority(self) -> u8 {
        match self {
            Self::Import => 1,
            Self::Assignment => 2,
            Self::Function | Self::DecoratedDefinition => 3,
            Self::Class => 4,
        }
    }

    pub fn from_type_str(s: &str) -> Option<Self> {
        match s {
            "import" => Some(Self::Import),
            "assignment" => Some(Self::Assignment),
            "function" => Some(Self::Function),
            "decorated_definition" => Some(Self::DecoratedDefinition),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

/// Configuration for one supported language
pub struct LanguageConfig {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    get_language: fn() -> Language,
    /// Node kinds extracted as candidate chunks
    pub element_nodes: &'static [(&'static str, ElementKind)],
    /// Container kinds eligible for header+members decomposition
    pub decomposable_nodes: &'static [&'static str],
    /// Body child kinds of those containers
    pub body_nodes: &'static [&'static str],
    /// Node kinds accepted as the element's name
    pub identifier_nodes: &'static [&'static str],
}

impl LanguageConfig {
    pub fn language(&self) -> Language {
        (self.get_language)()
    }

    pub fn element_kind(&self, node_kind: &str) -> Option<ElementKind> {
        self.element_nodes
            .iter()
            .find(|(kind, _)| *kind == node_kind)
            .map(|(_, element)| *element)
    }
}

const DEFAULT_IDENTIFIERS: &[&str] = &["identifier", "property_identifier", "type_identifier"];

lazy_static! {
    /// Registry of all supported language configurations
    pub static ref LANGUAGE_REGISTRY: HashMap<&'static str, LanguageConfig> = {
        let mut registry = HashMap::new();

        registry.insert(
            "python",
            LanguageConfig {
                id: "python",
                extensions: &[".py", ".pyi"],
                get_language: || tree_sitter_python::LANGUAGE.into(),
                element_nodes: &[
                    ("class_definition", ElementKind::Class),
                    ("function_definition", ElementKind::Function),
                    ("assignment", ElementKind::Assignment),
                    ("decorated_definition", ElementKind::DecoratedDefinition),
                    ("import_statement", ElementKind::Import),
                    ("import_from_statement", ElementKind::Import),
                ],
                decomposable_nodes: &["class_definition"],
                body_nodes: &["block"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "javascript",
            LanguageConfig {
                id: "javascript",
                extensions: &[".js", ".jsx", ".mjs"],
                get_language: || tree_sitter_javascript::LANGUAGE.into(),
                element_nodes: &[
                    ("class_declaration", ElementKind::Class),
                    ("function_declaration", ElementKind::Function),
                    ("method_definition", ElementKind::Function),
                    ("arrow_function", ElementKind::Function),
                    ("variable_declaration", ElementKind::Assignment),
                    ("import_statement", ElementKind::Import),
                    ("export_statement", ElementKind::Import),
                ],
                decomposable_nodes: &["class_declaration", "class"],
                body_nodes: &["class_body"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "typescript",
            LanguageConfig {
                id: "typescript",
                extensions: &[".ts", ".tsx"],
                get_language: || tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                element_nodes: &[
                    ("class_declaration", ElementKind::Class),
                    ("function_declaration", ElementKind::Function),
                    ("method_definition", ElementKind::Function),
                    ("arrow_function", ElementKind::Function),
                    ("variable_declaration", ElementKind::Assignment),
                    ("import_statement", ElementKind::Import),
                    ("export_statement", ElementKind::Import),
                ],
                decomposable_nodes: &["class_declaration", "class"],
                body_nodes: &["class_body"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "java",
            LanguageConfig {
                id: "java",
                extensions: &[".java"],
                get_language: || tree_sitter_java::LANGUAGE.into(),
                element_nodes: &[
                    ("class_declaration", ElementKind::Class),
                    ("interface_declaration", ElementKind::Class),
                    ("method_declaration", ElementKind::Function),
                    ("field_declaration", ElementKind::Assignment),
                    ("import_declaration", ElementKind::Import),
                    ("package_declaration", ElementKind::Import),
                ],
                decomposable_nodes: &["class_declaration", "interface_declaration"],
                body_nodes: &["class_body", "interface_body"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "cpp",
            LanguageConfig {
                id: "cpp",
                extensions: &[".cpp", ".cc", ".cxx", ".hpp", ".h", ".c"],
                get_language: || tree_sitter_cpp::LANGUAGE.into(),
                element_nodes: &[
                    ("class_specifier", ElementKind::Class),
                    ("struct_specifier", ElementKind::Class),
                    ("function_definition", ElementKind::Function),
                    ("declaration", ElementKind::Assignment),
                    ("preproc_include", ElementKind::Import),
                ],
                decomposable_nodes: &["class_specifier", "struct_specifier"],
                body_nodes: &["field_declaration_list"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "go",
            LanguageConfig {
                id: "go",
                extensions: &[".go"],
                get_language: || tree_sitter_go::LANGUAGE.into(),
                element_nodes: &[
                    ("type_declaration", ElementKind::Assignment),
                    ("function_declaration", ElementKind::Function),
                    ("method_declaration", ElementKind::Function),
                    ("var_declaration", ElementKind::Assignment),
                    ("import_declaration", ElementKind::Import),
                    ("package_clause", ElementKind::Import),
                ],
                // Go types stay whole; no header/members decomposition
                decomposable_nodes: &[],
                body_nodes: &[],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "rust",
            LanguageConfig {
                id: "rust",
                extensions: &[".rs"],
                get_language: || tree_sitter_rust::LANGUAGE.into(),
                element_nodes: &[
                    ("struct_item", ElementKind::Class),
                    ("enum_item", ElementKind::Class),
                    ("function_item", ElementKind::Function),
                    ("let_declaration", ElementKind::Assignment),
                    ("use_declaration", ElementKind::Import),
                ],
                decomposable_nodes: &["impl_item"],
                body_nodes: &["declaration_list"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry.insert(
            "csharp",
            LanguageConfig {
                id: "csharp",
                extensions: &[".cs"],
                get_language: || tree_sitter_c_sharp::LANGUAGE.into(),
                element_nodes: &[
                    ("class_declaration", ElementKind::Class),
                    ("interface_declaration", ElementKind::Class),
                    ("struct_declaration", ElementKind::Class),
                    ("method_declaration", ElementKind::Function),
                    ("property_declaration", ElementKind::Assignment),
                    ("field_declaration", ElementKind::Assignment),
                    ("using_directive", ElementKind::Import),
                ],
                decomposable_nodes: &[
                    "class_declaration",
                    "interface_declaration",
                    "struct_declaration",
                ],
                body_nodes: &["declaration_list"],
                identifier_nodes: DEFAULT_IDENTIFIERS,
            },
        );

        registry
    };

    /// Extension -> language id lookup built from the registry
    pub static ref EXTENSION_TO_LANGUAGE: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for config in LANGUAGE_REGISTRY.values() {
            for extension in config.extensions {
                map.insert(*extension, config.id);
            }
        }
        map
    };
}

/// Resolve a language config from the file extension first, then from
/// the caller-provided language tag.
pub fn resolve_language(
    file_path: &str,
    language_hint: Option<&str>,
) -> Option<&'static LanguageConfig> {
    let from_extension = std::path::Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .and_then(|ext| EXTENSION_TO_LANGUAGE.get(ext.as_str()))
        .and_then(|id| LANGUAGE_REGISTRY.get(id));

    from_extension.or_else(|| {
        language_hint
            .map(str::to_lowercase)
            .and_then(|hint| LANGUAGE_REGISTRY.get(hint.as_str()))
    })
}
