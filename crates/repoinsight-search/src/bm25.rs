//! BM25-Okapi scoring over tokenized documents

use std::collections::HashMap;

const K1: f64 = 1.5;
const B: f64 = 0.75;
/// Floor factor for negative IDF values: `epsilon * average_idf`
const EPSILON: f64 = 0.25;

/// Okapi BM25 index over a tokenized corpus
pub struct Bm25Index {
    term_frequencies: Vec<HashMap<String, usize>>,
    document_lengths: Vec<usize>,
    average_length: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    /// Build the index from per-document token lists.
    pub fn build(documents: &[Vec<String>]) -> Self {
        let document_count = documents.len();
        let mut term_frequencies = Vec::with_capacity(document_count);
        let mut document_lengths = Vec::with_capacity(document_count);
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for tokens in documents {
            document_lengths.push(tokens.len());
            let mut frequencies: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *frequencies.entry(token.clone()).or_insert(0) += 1;
            }
            for term in frequencies.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            term_frequencies.push(frequencies);
        }

        let average_length = if document_count == 0 {
            0.0
        } else {
            document_lengths.iter().sum::<usize>() as f64 / document_count as f64
        };

        // Raw IDF can go negative for very common terms; those are
        // floored at epsilon * average_idf as in BM25-Okapi.
        let n = document_count as f64;
        let mut idf: HashMap<String, f64> = HashMap::new();
        let mut idf_sum = 0.0;
        let mut negative_terms: Vec<String> = Vec::new();

        for (term, df) in &document_frequency {
            let value = ((n - *df as f64 + 0.5) / (*df as f64 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative_terms.push(term.clone());
            }
            idf.insert(term.clone(), value);
        }

        if !idf.is_empty() {
            let average_idf = idf_sum / idf.len() as f64;
            let floor = EPSILON * average_idf;
            for term in negative_terms {
                idf.insert(term, floor);
            }
        }

        Self {
            term_frequencies,
            document_lengths,
            average_length,
            idf,
        }
    }

    /// Number of documents in the index
    pub fn len(&self) -> usize {
        self.document_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document_lengths.is_empty()
    }

    /// BM25 score of every document against the query tokens.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.term_frequencies.len()];
        if self.average_length == 0.0 {
            return scores;
        }

        for token in query_tokens {
            let Some(idf) = self.idf.get(token) else {
                continue;
            };
            for (index, frequencies) in self.term_frequencies.iter().enumerate() {
                let frequency = *frequencies.get(token).unwrap_or(&0) as f64;
                if frequency == 0.0 {
                    continue;
                }
                let length_norm =
                    1.0 - B + B * self.document_lengths[index] as f64 / self.average_length;
                scores[index] += idf * (frequency * (K1 + 1.0)) / (frequency + K1 * length_norm);
            }
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<String>> {
        let docs = [
            "the quick brown fox",
            "the lazy dog sleeps",
            "quick routing table lookup",
        ];
        docs.iter()
            .map(|d| d.split_whitespace().map(String::from).collect())
            .collect()
    }

    #[test]
    fn matching_documents_score_higher() {
        let index = Bm25Index::build(&corpus());
        let scores = index.scores(&["routing".to_string()]);
        assert!(scores[2] > scores[0]);
        assert!(scores[2] > scores[1]);
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn rare_terms_outweigh_common_ones() {
        let index = Bm25Index::build(&corpus());
        let rare = index.scores(&["fox".to_string()]);
        let common = index.scores(&["the".to_string()]);
        assert!(rare[0] > common[0]);
    }

    #[test]
    fn empty_corpus_scores_nothing() {
        let index = Bm25Index::build(&[]);
        assert!(index.is_empty());
        assert!(index.scores(&["anything".to_string()]).is_empty());
    }

    #[test]
    fn unknown_query_terms_are_ignored() {
        let index = Bm25Index::build(&corpus());
        let scores = index.scores(&["zeppelin".to_string()]);
        assert!(scores.iter().all(|s| *s == 0.0));
    }
}
