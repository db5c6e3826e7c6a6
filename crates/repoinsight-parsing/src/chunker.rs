//! Syntax-aware chunking
//!
//! Code files in supported languages are parsed with tree-sitter and
//! decomposed into element chunks (classes, functions, imports,
//! module-level assignments). Everything else goes through the
//! recursive text splitter. Post-processing enforces the size budgets:
//! oversize elements are split (preferring class-header + members),
//! and small neighbours of compatible kinds are merged.

use crate::chunk::{count_non_whitespace, Chunk, ChunkMetadata, FallbackReason};
use crate::file_types::FileType;
use crate::languages::{resolve_language, ElementKind, LanguageConfig};
use crate::splitter::RecursiveTextSplitter;
use repoinsight_config::ChunkingConfig;
use tree_sitter::{Node, Parser};

/// Chunker configured with the size budgets from `ChunkingConfig`
pub struct CodeChunker {
    config: ChunkingConfig,
    splitter: RecursiveTextSplitter,
}

impl CodeChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        let splitter = RecursiveTextSplitter::new(config.chunk_size, config.chunk_overlap);
        Self { config, splitter }
    }

    /// Whether the syntax-aware path applies to this file
    pub fn supports(&self, file_path: &str, language_hint: Option<&str>) -> bool {
        resolve_language(file_path, language_hint).is_some()
    }

    /// Chunk one file's content.
    ///
    /// Code in a supported language takes the tree-sitter path; other
    /// files use the separator splitter. Always returns chunks in file
    /// order with `chunk_index` assigned.
    #[tracing::instrument(skip(self, content), fields(path = relative_path, bytes = content.len()))]
    pub fn chunk_file(
        &self,
        content: &str,
        relative_path: &str,
        file_type: FileType,
        language_hint: Option<&str>,
    ) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = if file_type == FileType::Code {
            match resolve_language(relative_path, language_hint) {
                Some(config) => self.chunk_code(content, relative_path, config),
                None => self.chunk_text(content, relative_path, language_hint),
            }
        } else {
            self.chunk_text(content, relative_path, language_hint)
        };

        for (index, chunk) in chunks.iter_mut().enumerate() {
            chunk.metadata.chunk_index = index;
        }
        chunks
    }

    // ------------------------------------------------------------------
    // Plain-text path
    // ------------------------------------------------------------------

    fn chunk_text(
        &self,
        content: &str,
        relative_path: &str,
        language_hint: Option<&str>,
    ) -> Vec<Chunk> {
        let language = language_hint.unwrap_or("").to_string();
        let prefixed = format!("File path: {relative_path}\n\n{content}");
        let pieces = self.splitter.split_text(&prefixed);

        // Rough line estimate: assume ~50 characters per line
        let lines_per_chunk = (self.config.chunk_size / 50).max(1);

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| {
                let start_line = i * lines_per_chunk + 1;
                let end_line = start_line + piece.lines().count().saturating_sub(1);
                Chunk {
                    content: piece,
                    metadata: ChunkMetadata::element(
                        relative_path,
                        "text",
                        file_basename(relative_path),
                        start_line,
                        end_line,
                        language.clone(),
                    ),
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Syntax-aware path
    // ------------------------------------------------------------------

    fn chunk_code(
        &self,
        content: &str,
        relative_path: &str,
        config: &'static LanguageConfig,
    ) -> Vec<Chunk> {
        let mut parser = Parser::new();
        if parser.set_language(&config.language()).is_err() {
            tracing::warn!(language = config.id, "Grammar failed to load");
            return vec![self.fallback_chunk(
                content,
                relative_path,
                config.id,
                FallbackReason::UnsupportedLanguage,
            )];
        }

        let Some(tree) = parser.parse(content, None) else {
            return vec![self.fallback_chunk(
                content,
                relative_path,
                config.id,
                FallbackReason::AstParsingFailed,
            )];
        };

        let root = tree.root_node();
        if root.has_error() {
            tracing::warn!(path = relative_path, "Syntax tree contains errors");
        }

        let mut elements = Vec::new();
        self.extract_elements(root, content, relative_path, config, &mut elements);

        if elements.is_empty() {
            // Nothing element-shaped in the file (e.g. comments only)
            return Vec::new();
        }

        let mut processed = Vec::new();
        for element in elements {
            if element.non_whitespace_len() > self.config.max_chunk_size {
                processed.extend(self.split_oversize(&element, config));
            } else {
                processed.push(element);
            }
        }

        self.merge_small(processed, relative_path, config.id)
    }

    fn fallback_chunk(
        &self,
        content: &str,
        relative_path: &str,
        language: &str,
        reason: FallbackReason,
    ) -> Chunk {
        let mut metadata = ChunkMetadata::element(
            relative_path,
            "file",
            file_basename(relative_path),
            1,
            content.lines().count().max(1),
            language,
        );
        metadata.fallback = Some(reason);
        Chunk {
            content: content.to_string(),
            metadata,
        }
    }

    /// Walk the whole tree, emitting every element-typed node.
    /// Recursion continues into extracted nodes so nested members are
    /// candidates in their own right; nested assignments are dropped
    /// (module level only).
    fn extract_elements(
        &self,
        node: Node<'_>,
        source: &str,
        relative_path: &str,
        config: &LanguageConfig,
        out: &mut Vec<Chunk>,
    ) {
        if let Some(kind) = config.element_kind(node.kind()) {
            let keep = !(kind == ElementKind::Assignment && is_nested_in_definition(node, config));
            if keep {
                if let Some(content) = node_text(node, source) {
                    let name = match kind {
                        ElementKind::Import => content.trim().to_string(),
                        ElementKind::Assignment => {
                            extract_variable_name(node, source, config, content)
                        }
                        _ => extract_identifier(node, source, config),
                    };
                    out.push(Chunk {
                        content: content.to_string(),
                        metadata: ChunkMetadata::element(
                            relative_path,
                            kind.as_str(),
                            name,
                            node.start_position().row + 1,
                            node.end_position().row + 1,
                            config.id,
                        ),
                    });
                }
            }
        }

        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.extract_elements(child, source, relative_path, config, out);
            }
        }
    }

    // ------------------------------------------------------------------
    // Oversize splitting
    // ------------------------------------------------------------------

    /// Split an element larger than `max_chunk_size`, preferring
    /// syntax-unit aggregation (with class-header decomposition) and
    /// falling back to line-based splitting.
    fn split_oversize(&self, element: &Chunk, config: &LanguageConfig) -> Vec<Chunk> {
        if let Some(chunks) = self.split_by_syntax_units(element, config) {
            if !chunks.is_empty() {
                return chunks;
            }
        }
        self.split_by_lines(element)
    }

    fn split_by_syntax_units(
        &self,
        element: &Chunk,
        config: &LanguageConfig,
    ) -> Option<Vec<Chunk>> {
        let source = element.content.as_str();
        let mut parser = Parser::new();
        parser.set_language(&config.language()).ok()?;
        let tree = parser.parse(source, None)?;
        let units = self.syntax_units(tree.root_node(), source, config);
        if units.is_empty() {
            return None;
        }

        let chunk_size = self.config.chunk_size;
        let min_size = self.config.min_chunk_size;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current_parts: Vec<String> = Vec::new();
        let mut current_size = 0_usize;

        for (start, end) in units {
            let Some(part) = source.get(start..end).map(str::trim) else {
                continue;
            };
            if part.is_empty() {
                continue;
            }
            let part_size = count_non_whitespace(part);

            // A single unit beyond the cap gets line-split on its own
            if part_size > self.config.max_chunk_size {
                if !current_parts.is_empty() {
                    self.flush_parts(&mut chunks, &mut current_parts, &mut current_size, element);
                }
                let sub_element = Chunk {
                    content: part.to_string(),
                    metadata: element.metadata.clone(),
                };
                chunks.extend(self.split_by_lines(&sub_element));
                continue;
            }

            let should_flush = !current_parts.is_empty()
                && ((current_size + part_size > chunk_size && current_size >= min_size)
                    || (current_size * 10 >= chunk_size * 8
                        && (current_size + part_size) * 10 > chunk_size * 12)
                    || (current_size * 10 >= chunk_size * 6
                        && is_major_boundary(part)
                        && (current_size + part_size) * 10 > chunk_size * 15));

            if should_flush {
                self.flush_parts(&mut chunks, &mut current_parts, &mut current_size, element);
            }

            current_size += part_size;
            current_parts.push(part.to_string());
        }

        if !current_parts.is_empty() {
            let content = current_parts.join("\n");
            chunks.push(self.make_split_chunk(content, element));
        }

        Some(chunks)
    }

    /// Emit the accumulated parts as a chunk, then seed the next window
    /// with whole trailing units whose combined size fits the overlap.
    fn flush_parts(
        &self,
        chunks: &mut Vec<Chunk>,
        current_parts: &mut Vec<String>,
        current_size: &mut usize,
        element: &Chunk,
    ) {
        if current_parts.is_empty() {
            return;
        }
        let content = current_parts.join("\n");
        chunks.push(self.make_split_chunk(content, element));

        let mut overlap_parts: Vec<String> = Vec::new();
        let mut overlap_size = 0_usize;
        for part in current_parts.iter().rev() {
            let size = count_non_whitespace(part);
            if overlap_size + size <= self.config.chunk_overlap {
                overlap_parts.insert(0, part.clone());
                overlap_size += size;
            } else {
                break;
            }
        }

        *current_parts = overlap_parts;
        *current_size = overlap_size;
    }

    /// Candidate syntax-unit byte ranges for aggregation.
    ///
    /// Decomposable containers (classes, impl blocks) larger than
    /// `chunk_size * class_decompose_threshold` contribute a header
    /// range plus one range per member; gaps against the root range are
    /// filled so nothing is dropped.
    fn syntax_units(
        &self,
        root: Node<'_>,
        source: &str,
        config: &LanguageConfig,
    ) -> Vec<(usize, usize)> {
        let decompose_above =
            (self.config.chunk_size as f64 * self.config.class_decompose_threshold) as usize;

        let mut container = root;
        if root.named_child_count() == 1 {
            if let Some(only) = root.named_child(0) {
                let total = root.end_byte().saturating_sub(root.start_byte());
                let span = only.end_byte().saturating_sub(only.start_byte());
                if span + 1 >= total {
                    container = only;
                }
            }
        }

        let mut units: Vec<(usize, usize)> = Vec::new();

        if config.decomposable_nodes.contains(&container.kind()) {
            // The element itself is a class-like container: header,
            // then each member.
            match find_body(container, config) {
                Some(body) => {
                    push_header_and_members(container, body, &mut units);
                }
                None => units.push((container.start_byte(), container.end_byte())),
            }
        } else {
            for i in 0..container.named_child_count() {
                let Some(unit) = container.named_child(i) else {
                    continue;
                };
                let unit_size = unit.end_byte().saturating_sub(unit.start_byte());
                if config.decomposable_nodes.contains(&unit.kind()) && unit_size > decompose_above
                {
                    match find_body(unit, config) {
                        Some(body) => push_header_and_members(unit, body, &mut units),
                        None => units.push((unit.start_byte(), unit.end_byte())),
                    }
                } else {
                    units.push((unit.start_byte(), unit.end_byte()));
                }
            }
        }

        units.retain(|(s, e)| e > s);
        units.sort_by_key(|(s, _)| *s);

        if units.is_empty() {
            return vec![(root.start_byte(), root.end_byte())];
        }

        // Fill gaps against the root range so stray tokens and comments
        // between units survive the split.
        let mut ranges = Vec::with_capacity(units.len() + 2);
        let mut prev_end = units[0].0;
        if prev_end > root.start_byte() {
            ranges.push((root.start_byte(), prev_end));
        }
        for (start, end) in units {
            ranges.push((start, end));
            prev_end = end;
        }
        if prev_end < root.end_byte() {
            ranges.push((prev_end, root.end_byte()));
        }

        ranges
            .into_iter()
            .filter(|(s, e)| {
                source
                    .get(*s..*e)
                    .is_some_and(|seg| count_non_whitespace(seg) > 0)
            })
            .collect()
    }

    /// Line-based splitting that respects the non-whitespace budget and
    /// carries a tail overlap into the next split.
    fn split_by_lines(&self, element: &Chunk) -> Vec<Chunk> {
        let chunk_size = self.config.chunk_size;
        let min_size = self.config.min_chunk_size;

        let mut chunks = Vec::new();
        let mut current_lines: Vec<String> = Vec::new();
        let mut current_size = 0_usize;

        for raw_line in element.content.lines() {
            // A single pathological line beyond the hard cap is carved
            // into character windows so no chunk can exceed it.
            if count_non_whitespace(raw_line) > self.config.max_chunk_size {
                if !current_lines.is_empty() {
                    let content = current_lines.join("\n");
                    chunks.push(self.make_split_chunk(content, element));
                    current_lines = self.overlap_lines(&current_lines);
                    current_size = count_non_whitespace(&current_lines.join("\n"));
                }
                for window in char_windows(raw_line, chunk_size) {
                    chunks.push(self.make_split_chunk(window, element));
                }
                continue;
            }

            let line_size = count_non_whitespace(raw_line);
            if current_size + line_size > chunk_size
                && !current_lines.is_empty()
                && current_size >= min_size
            {
                let content = current_lines.join("\n");
                chunks.push(self.make_split_chunk(content, element));

                let mut next = self.overlap_lines(&current_lines);
                next.push(raw_line.to_string());
                current_size = count_non_whitespace(&next.join("\n"));
                current_lines = next;
            } else {
                current_lines.push(raw_line.to_string());
                current_size += line_size;
            }
        }

        if !current_lines.is_empty() {
            let content = current_lines.join("\n");
            if count_non_whitespace(&content) > 0 {
                chunks.push(self.make_split_chunk(content, element));
            }
        }

        chunks
    }

    fn overlap_lines(&self, lines: &[String]) -> Vec<String> {
        if self.config.chunk_overlap == 0 {
            return Vec::new();
        }
        let mut overlap = Vec::new();
        let mut size = 0_usize;
        for line in lines.iter().rev() {
            let line_size = count_non_whitespace(line);
            if size + line_size <= self.config.chunk_overlap {
                overlap.insert(0, line.clone());
                size += line_size;
            } else {
                break;
            }
        }
        overlap
    }

    fn make_split_chunk(&self, content: String, element: &Chunk) -> Chunk {
        let mut metadata = element.metadata.clone();
        metadata.is_chunk = true;
        Chunk { content, metadata }
    }

    // ------------------------------------------------------------------
    // Merging
    // ------------------------------------------------------------------

    /// Coalesce small adjacent chunks of compatible kinds.
    fn merge_small(&self, chunks: Vec<Chunk>, relative_path: &str, language: &str) -> Vec<Chunk> {
        if chunks.is_empty() {
            return chunks;
        }

        let mut sorted = chunks;
        sorted.sort_by(|a, b| {
            let pa = merge_priority(&a.metadata.element_type);
            let pb = merge_priority(&b.metadata.element_type);
            pa.cmp(&pb)
                .then(a.metadata.start_line.cmp(&b.metadata.start_line))
        });

        let mut merged: Vec<Chunk> = Vec::new();
        let mut group: Vec<Chunk> = Vec::new();
        let mut group_size = 0_usize;

        for chunk in sorted {
            let size = chunk.non_whitespace_len();

            if size >= self.config.min_chunk_size {
                if !group.is_empty() {
                    merged.push(self.merged_chunk(std::mem::take(&mut group), relative_path, language));
                    group_size = 0;
                }
                merged.push(chunk);
                continue;
            }

            let can_merge = group
                .last()
                .is_none_or(|last| mergeable(last, &chunk, self.config.min_chunk_size));

            if can_merge && group_size + size <= self.config.chunk_size {
                group_size += size;
                group.push(chunk);
            } else {
                if !group.is_empty() {
                    merged.push(self.merged_chunk(std::mem::take(&mut group), relative_path, language));
                }
                group_size = size;
                group.push(chunk);
            }
        }

        if !group.is_empty() {
            merged.push(self.merged_chunk(group, relative_path, language));
        }

        merged
    }

    fn merged_chunk(&self, group: Vec<Chunk>, relative_path: &str, language: &str) -> Chunk {
        if group.len() == 1 {
            return group.into_iter().next().unwrap_or_else(|| Chunk {
                content: String::new(),
                metadata: ChunkMetadata::element(relative_path, "merged", "", 1, 1, language),
            });
        }

        let content = group
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        // Plurality element type; earlier start_line wins ties through
        // the stable iteration order
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for chunk in &group {
            match counts
                .iter_mut()
                .find(|(t, _)| *t == chunk.metadata.element_type.as_str())
            {
                Some((_, n)) => *n += 1,
                None => counts.push((chunk.metadata.element_type.as_str(), 1)),
            }
        }
        let main_type = counts
            .iter()
            .max_by_key(|(_, n)| *n)
            .map_or("merged", |(t, _)| *t)
            .to_string();

        let names: Vec<String> = group
            .iter()
            .map(|c| c.metadata.element_name.clone())
            .collect();
        let start_line = group
            .iter()
            .map(|c| c.metadata.start_line)
            .min()
            .unwrap_or(1);
        let end_line = group
            .iter()
            .map(|c| c.metadata.end_line)
            .max()
            .unwrap_or(start_line);

        let mut metadata = ChunkMetadata::element(
            relative_path,
            main_type.clone(),
            format!("merged_{main_type}"),
            start_line,
            end_line,
            language,
        );
        metadata.is_merged = true;
        metadata.merged_names = Some(names);

        Chunk { content, metadata }
    }
}

// ----------------------------------------------------------------------
// Free helpers
// ----------------------------------------------------------------------

fn node_text<'a>(node: Node<'_>, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

fn file_basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn merge_priority(element_type: &str) -> u8 {
    ElementKind::from_type_str(element_type).map_or(5, ElementKind::merge_priority)
}

/// Two small chunks may merge when: both imports, both assignments, or
/// both functions below the minimum size.
fn mergeable(last: &Chunk, next: &Chunk, min_chunk_size: usize) -> bool {
    let a = last.metadata.element_type.as_str();
    let b = next.metadata.element_type.as_str();

    if a == "import" && b == "import" {
        return true;
    }
    if a == "assignment" && b == "assignment" {
        return true;
    }
    let function_like = |t: &str| t == "function" || t == "decorated_definition";
    if function_like(a) && function_like(b) {
        return last.non_whitespace_len() < min_chunk_size
            && next.non_whitespace_len() < min_chunk_size;
    }
    false
}

/// Python keeps assignments at module level only
fn is_nested_in_definition(node: Node<'_>, config: &LanguageConfig) -> bool {
    if config.id != "python" {
        return false;
    }
    let mut current = node.parent();
    while let Some(parent) = current {
        if matches!(parent.kind(), "function_definition" | "class_definition") {
            return true;
        }
        current = parent.parent();
    }
    false
}

fn find_body<'t>(node: Node<'t>, config: &LanguageConfig) -> Option<Node<'t>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if config.body_nodes.contains(&child.kind()) {
                return Some(child);
            }
        }
    }
    None
}

fn push_header_and_members(container: Node<'_>, body: Node<'_>, units: &mut Vec<(usize, usize)>) {
    // Declaration through the opening of the body
    units.push((container.start_byte(), body.start_byte()));
    for i in 0..body.named_child_count() {
        if let Some(member) = body.named_child(i) {
            units.push((member.start_byte(), member.end_byte()));
        }
    }
}

/// Identifier extraction: JS methods name via `property_identifier`,
/// otherwise the first child of an accepted identifier kind, recursing
/// with a depth limit.
fn extract_identifier(node: Node<'_>, source: &str, config: &LanguageConfig) -> String {
    if node.kind() == "method_definition" {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                if child.kind() == "property_identifier" {
                    return node_text(child, source).unwrap_or("Unknown").to_string();
                }
            }
        }
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if config.identifier_nodes.contains(&child.kind()) {
                return node_text(child, source).unwrap_or("Unknown").to_string();
            }
        }
    }

    extract_identifier_recursive(node, source, config, 3)
}

fn extract_identifier_recursive(
    node: Node<'_>,
    source: &str,
    config: &LanguageConfig,
    depth: usize,
) -> String {
    if depth == 0 {
        return "Unknown".to_string();
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if config.identifier_nodes.contains(&child.kind()) {
                return node_text(child, source).unwrap_or("Unknown").to_string();
            }
            let found = extract_identifier_recursive(child, source, config, depth - 1);
            if found != "Unknown" {
                return found;
            }
        }
    }
    "Unknown".to_string()
}

fn extract_variable_name(
    node: Node<'_>,
    source: &str,
    config: &LanguageConfig,
    content: &str,
) -> String {
    // Fast path for simple assignments
    if config.id == "python" {
        if let Some(lhs) = content.split('=').next() {
            let name = lhs.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    extract_identifier(node, source, config)
}

/// Major syntax boundaries preferred as flush points during aggregation
fn is_major_boundary(content: &str) -> bool {
    const PREFIXES: &[&str] = &[
        // Python
        "class ", "def ", "async def ", "@",
        // JavaScript / TypeScript
        "function ", "export ", "import ", "const ", "let ", "var ",
        // Java / C#
        "public ", "private ", "protected ", "internal ", "namespace ", "using ",
        // Go
        "func ", "type ", "package ",
        // Rust
        "fn ", "struct ", "enum ", "impl ", "trait ", "mod ", "use ",
        "pub fn ", "pub struct ", "pub enum ", "pub trait ", "pub mod ",
        // C / C++
        "template ", "template<", "#include ", "#define ", "extern ", "static ",
        "inline ", "virtual ", "public:", "private:", "protected:",
    ];
    let trimmed = content.trim_start();
    PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

fn char_windows(line: &str, window: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(window.max(1))
        .map(|w| w.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> CodeChunker {
        CodeChunker::new(ChunkingConfig::default())
    }

    fn small_chunker() -> CodeChunker {
        CodeChunker::new(ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 40,
            min_chunk_size: 30,
            max_chunk_size: 400,
            class_decompose_threshold: 1.5,
            max_file_size_bytes: 1024 * 1024,
        })
    }

    const PYTHON_FILE: &str = r#"import os
import sys

DEBUG = True

def read_config(path):
    with open(path) as handle:
        return handle.read()

def write_config(path, data):
    with open(path, "w") as handle:
        handle.write(data)

class ConfigStore:
    def __init__(self, root):
        self.root = root

    def load(self, name):
        return read_config(os.path.join(self.root, name))
"#;

    #[test]
    fn python_elements_are_extracted_with_names() {
        let chunks = chunker().chunk_file(PYTHON_FILE, "src/config.py", FileType::Code, None);
        assert!(!chunks.is_empty());

        let names: Vec<&str> = chunks
            .iter()
            .map(|c| c.metadata.element_name.as_str())
            .collect();
        let types: Vec<&str> = chunks
            .iter()
            .map(|c| c.metadata.element_type.as_str())
            .collect();

        // The class survives whole at the default budgets
        assert!(
            names.contains(&"ConfigStore")
                || names.iter().any(|n| n.starts_with("merged_")),
            "missing class chunk in {names:?}"
        );
        assert!(types.iter().any(|t| *t == "class" || *t == "function"));
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let chunks = chunker().chunk_file(PYTHON_FILE, "src/config.py", FileType::Code, None);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
        }
    }

    #[test]
    fn start_line_never_exceeds_end_line() {
        let chunks = small_chunker().chunk_file(PYTHON_FILE, "src/config.py", FileType::Code, None);
        for chunk in &chunks {
            assert!(chunk.metadata.start_line <= chunk.metadata.end_line);
        }
    }

    #[test]
    fn size_bounds_hold_for_any_input() {
        let big_function = {
            let mut s = String::from("def enormous():\n");
            for i in 0..400 {
                s.push_str(&format!("    value_{i} = compute_something({i}, {i})\n"));
            }
            s
        };
        let chunker = small_chunker();
        let chunks = chunker.chunk_file(&big_function, "src/big.py", FileType::Code, None);

        assert!(chunks.len() > 1, "oversize function should be split");
        for chunk in &chunks {
            assert!(
                chunk.non_whitespace_len() <= 400,
                "chunk exceeds max_chunk_size: {} chars",
                chunk.non_whitespace_len()
            );
        }
    }

    #[test]
    fn coverage_is_preserved_within_overlap_tolerance() {
        // No classes and no comments so extraction covers the file
        // without duplicating member content
        let source = "import os\n\ndef alpha():\n    return 1\n\ndef beta():\n    return 2\n";
        let chunks = chunker().chunk_file(source, "src/flat.py", FileType::Code, None);

        let input_size = count_non_whitespace(source);
        let output_size: usize = chunks.iter().map(Chunk::non_whitespace_len).sum();
        let tolerance = chunks.len() * ChunkingConfig::default().chunk_overlap;

        assert!(
            output_size.abs_diff(input_size) <= tolerance,
            "coverage drifted: input {input_size}, output {output_size}, tolerance {tolerance}"
        );
    }

    #[test]
    fn small_imports_merge_into_one_chunk() {
        let source = "import os\nimport sys\nimport json\n";
        let chunks = chunker().chunk_file(source, "src/imports.py", FileType::Code, None);

        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert!(chunk.metadata.is_merged);
        assert_eq!(chunk.metadata.element_type, "import");
        assert_eq!(chunk.metadata.element_name, "merged_import");
        let names = chunk.metadata.merged_names.as_ref().unwrap();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn oversize_class_is_decomposed_into_header_and_members() {
        let mut source = String::from("class Massive:\n");
        for i in 0..60 {
            source.push_str(&format!(
                "    def method_{i}(self):\n        return self.value + {i}\n\n"
            ));
        }
        let chunker = small_chunker();
        let chunks = chunker.chunk_file(&source, "src/massive.py", FileType::Code, None);

        assert!(chunks.len() > 2);
        // The class declaration line survives at the front of a chunk
        assert!(
            chunks
                .iter()
                .any(|c| c.content.lines().next().is_some_and(|l| l.starts_with("class Massive"))),
            "class header missing"
        );
    }

    #[test]
    fn non_code_files_use_the_text_splitter() {
        let text = "# Heading\n\nSome documentation paragraph.\n\nAnother paragraph.";
        let chunks = chunker().chunk_file(text, "README.md", FileType::Document, Some("markdown"));

        assert!(!chunks.is_empty());
        assert!(chunks[0].content.starts_with("File path: README.md"));
        assert_eq!(chunks[0].metadata.element_type, "text");
    }

    #[test]
    fn unsupported_code_language_falls_back_to_text() {
        let source = "(defn add [a b] (+ a b))";
        let chunks = chunker().chunk_file(source, "core.clj", FileType::Code, None);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.element_type, "text");
    }

    #[test]
    fn rust_elements_resolve_type_identifiers() {
        let source = "use std::fmt;\n\npub struct Widget {\n    pub id: u32,\n}\n\nfn build() -> Widget {\n    Widget { id: 1 }\n}\n";
        let chunks = chunker().chunk_file(source, "src/widget.rs", FileType::Code, None);
        let all_names: Vec<String> = chunks
            .iter()
            .flat_map(|c| {
                c.metadata.merged_names.clone().unwrap_or_else(|| {
                    vec![c.metadata.element_name.clone()]
                })
            })
            .collect();
        assert!(
            all_names.iter().any(|n| n == "Widget"),
            "struct name missing from {all_names:?}"
        );
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunker()
            .chunk_file("   \n  ", "src/empty.py", FileType::Code, None)
            .is_empty());
    }
}
