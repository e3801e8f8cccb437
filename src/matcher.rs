use crate::error::{HavenError, Result};
use crate::types::{CorpusEntry, Recommendation};
use crate::vectorizer::{cosine_similarity, for_strategy, Vectorizer};

/// Default number of recommendations per query
pub const DEFAULT_K: usize = 3;

/// Mood-to-recommendation matcher.
///
/// Fit once at startup against a fixed corpus; `recommend` is read-only
/// afterwards and safe for concurrent callers. There is no hidden global
/// state and no re-fitting per request.
pub struct MoodMatcher {
    corpus: Vec<CorpusEntry>,
    vectorizer: Box<dyn Vectorizer>,
    corpus_vectors: Vec<Vec<f32>>,
}

impl std::fmt::Debug for MoodMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodMatcher")
            .field("corpus", &self.corpus)
            .field("vectorizer", &self.vectorizer.name())
            .field("corpus_vectors", &self.corpus_vectors)
            .finish()
    }
}

impl MoodMatcher {
    /// Fit a matcher over `corpus` using the named vectorizer strategy.
    ///
    /// Fails with `EmptyCorpus` when there is nothing to match against,
    /// and with `Config` for an unknown strategy.
    pub fn fit(corpus: Vec<CorpusEntry>, strategy: &str) -> Result<Self> {
        if corpus.is_empty() {
            return Err(HavenError::EmptyCorpus);
        }

        let documents: Vec<String> = corpus.iter().map(CorpusEntry::document).collect();

        let mut vectorizer = for_strategy(strategy)?;
        vectorizer.fit(&documents)?;

        let corpus_vectors = documents
            .iter()
            .map(|doc| vectorizer.vectorize(doc))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            strategy = vectorizer.name(),
            entries = corpus.len(),
            "matcher fit"
        );

        Ok(Self {
            corpus,
            vectorizer,
            corpus_vectors,
        })
    }

    pub fn corpus(&self) -> &[CorpusEntry] {
        &self.corpus
    }

    pub fn strategy(&self) -> &'static str {
        self.vectorizer.name()
    }

    /// Rank the corpus against `text` and return the top `k` entries.
    ///
    /// Scores are cosine similarities sorted descending; ties order by
    /// ascending corpus index, so results are fully deterministic. A query
    /// with no vocabulary overlap scores 0 everywhere and falls back to
    /// corpus order. `k = 0` yields an empty result; `k` larger than the
    /// corpus yields the whole corpus.
    pub fn recommend(&self, text: &str, k: usize) -> Result<Vec<Recommendation>> {
        let query = self.vectorizer.vectorize(text)?;

        let mut scored: Vec<(usize, f64)> = self
            .corpus_vectors
            .iter()
            .enumerate()
            .map(|(idx, doc)| (idx, cosine_similarity(&query, doc)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| {
                let entry = &self.corpus[idx];
                Recommendation {
                    label: entry.label.clone(),
                    tip: entry.tip.clone(),
                    score,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_corpus() -> Vec<CorpusEntry> {
        vec![
            CorpusEntry::new("anxious", "breathe deeply"),
            CorpusEntry::new("sad", "call a friend"),
        ]
    }

    #[test]
    fn test_fit_empty_corpus_fails() {
        let err = MoodMatcher::fit(Vec::new(), "tfidf").unwrap_err();
        assert!(matches!(err, HavenError::EmptyCorpus));
    }

    #[test]
    fn test_fit_unknown_strategy_fails() {
        let err = MoodMatcher::fit(sample_corpus(), "bert").unwrap_err();
        assert!(matches!(err, HavenError::Config(_)));
    }

    #[test]
    fn test_anxious_query_matches_anxious_entry() {
        let matcher = MoodMatcher::fit(sample_corpus(), "tfidf").unwrap();
        let recs = matcher.recommend("I feel anxious today", 2).unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].label, "anxious");
        assert!(recs[0].score > recs[1].score);
    }

    #[test]
    fn test_scores_are_non_increasing() {
        let matcher = MoodMatcher::fit(crate::corpus::builtin(), "tfidf").unwrap();
        let recs = matcher
            .recommend("I am anxious and cannot sleep", DEFAULT_K)
            .unwrap();

        assert!(recs.len() <= DEFAULT_K);
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let matcher = MoodMatcher::fit(crate::corpus::builtin(), "tfidf").unwrap();
        let a = matcher.recommend("feeling stressed at work", 5).unwrap();
        let b = matcher.recommend("feeling stressed at work", 5).unwrap();

        let labels_a: Vec<&str> = a.iter().map(|r| r.label.as_str()).collect();
        let labels_b: Vec<&str> = b.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels_a, labels_b);
    }

    #[test]
    fn test_zero_overlap_query_ties_break_by_corpus_order() {
        let matcher = MoodMatcher::fit(sample_corpus(), "tfidf").unwrap();
        // No shared vocabulary: every score is 0, order falls back to
        // corpus order
        let recs = matcher.recommend("zzz qqq", 2).unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].label, "anxious");
        assert_eq!(recs[1].label, "sad");
        assert_eq!(recs[0].score, 0.0);
        assert_eq!(recs[1].score, 0.0);
    }

    #[test]
    fn test_k_zero_yields_empty() {
        let matcher = MoodMatcher::fit(sample_corpus(), "tfidf").unwrap();
        let recs = matcher.recommend("anxious", 0).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_k_larger_than_corpus_clamps() {
        let matcher = MoodMatcher::fit(sample_corpus(), "tfidf").unwrap();
        let recs = matcher.recommend("anxious", 50).unwrap();
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_hash_strategy_also_ranks() {
        let matcher = MoodMatcher::fit(sample_corpus(), "hash").unwrap();
        let recs = matcher.recommend("I feel anxious today", 2).unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].label, "anxious");
    }
}
