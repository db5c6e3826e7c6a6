//! Recursive separator-based text splitting
//!
//! Fallback strategy for non-code files and unsupported languages:
//! split at the strongest boundary available (`\n\n`, `\n`, space,
//! character) targeting `chunk_size` characters with `chunk_overlap`
//! carried between neighbours.

/// Recursive character splitter with a fixed separator hierarchy
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }

    /// Split text into chunks of at most roughly `chunk_size` chars
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator.as_str()).map(String::from).collect()
        };

        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<String> = Vec::new();

        for split in splits {
            if char_len(&split) < self.chunk_size {
                good_splits.push(split);
            } else {
                if !good_splits.is_empty() {
                    final_chunks.extend(self.merge_splits(&good_splits, &separator));
                    good_splits.clear();
                }
                if remaining.is_empty() {
                    final_chunks.push(split);
                } else {
                    final_chunks.extend(self.split_recursive(&split, remaining));
                }
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, &separator));
        }

        final_chunks
    }

    /// Greedily pack splits up to `chunk_size`, then drop leading
    /// splits until the running window fits inside `chunk_overlap`.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut total = 0_usize;

        for split in splits {
            let len = char_len(split);
            let joined_extra = if current.is_empty() { 0 } else { separator_len };

            if total + len + joined_extra > self.chunk_size && !current.is_empty() {
                let doc = current.join(separator).trim().to_string();
                if !doc.is_empty() {
                    docs.push(doc);
                }
                while total > self.chunk_overlap
                    || (total + len + joined_extra > self.chunk_size && total > 0)
                {
                    let removed = char_len(&current[0])
                        + if current.len() > 1 { separator_len } else { 0 };
                    total = total.saturating_sub(removed);
                    current.remove(0);
                    if current.is_empty() {
                        break;
                    }
                }
            }

            total += len + if current.is_empty() { 0 } else { separator_len };
            current.push(split.clone());
        }

        let doc = current.join(separator).trim().to_string();
        if !doc.is_empty() {
            docs.push(doc);
        }
        docs
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (String, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator.as_str()) {
            return (
                separator.clone(),
                separators.get(i + 1..).unwrap_or(&[]),
            );
        }
    }
    (String::new(), &[])
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = RecursiveTextSplitter::new(100, 20);
        let chunks = splitter.split_text("hello world");
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn splits_on_paragraph_boundaries_first() {
        let splitter = RecursiveTextSplitter::new(20, 0);
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "first paragraph here");
        assert_eq!(chunks[1], "second paragraph here");
    }

    #[test]
    fn every_chunk_respects_the_size_budget() {
        let splitter = RecursiveTextSplitter::new(30, 5);
        let text = "word ".repeat(100);
        for chunk in splitter.split_text(&text) {
            assert!(chunk.chars().count() <= 30, "oversize chunk: {chunk:?}");
        }
    }

    #[test]
    fn long_unbroken_text_falls_through_to_characters() {
        let splitter = RecursiveTextSplitter::new(10, 0);
        let text = "a".repeat(35);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn overlap_carries_trailing_content() {
        let splitter = RecursiveTextSplitter::new(12, 6);
        let chunks = splitter.split_text("aaa bbb ccc ddd eee");
        assert!(chunks.len() > 1);
        // Consecutive chunks share at least one word when overlap is on
        let shares_overlap = chunks.windows(2).any(|pair| {
            pair[0]
                .split_whitespace()
                .any(|w| pair[1].split_whitespace().any(|v| v == w))
        });
        assert!(shares_overlap, "no overlap found in {chunks:?}");
    }
}
