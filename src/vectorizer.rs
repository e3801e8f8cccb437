use crate::error::{HavenError, Result};
use md5::{Digest, Md5};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Vector width of the hashing vectorizer
const HASH_DIM: usize = 384;

/// Fixed English stop-word list applied by the tf-idf strategy.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
    "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing",
    "down", "during", "each", "few", "for", "from", "further", "had", "has",
    "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i",
    "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my",
    "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
    "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "you", "your", "yours",
];

/// Trait for text vectorization strategies.
///
/// `fit` learns any corpus-dependent state once at startup; `vectorize` is
/// a pure function of the input text and the fitted state and is safe for
/// concurrent reads after fitting.
pub trait Vectorizer {
    fn fit(&mut self, documents: &[String]) -> Result<()>;
    fn vectorize(&self, text: &str) -> Result<Vec<f32>>;
    fn name(&self) -> &'static str;
}

/// Build the vectorizer for a named strategy.
pub fn for_strategy(strategy: &str) -> Result<Box<dyn Vectorizer>> {
    match strategy {
        "tfidf" => Ok(Box::new(TfidfVectorizer::new())),
        "hash" => Ok(Box::new(HashVectorizer::new())),
        other => Err(HavenError::Config(format!(
            "unknown vectorizer strategy: {}",
            other
        ))),
    }
}

fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9']+").expect("static word pattern"))
}

/// Lowercase, extract word tokens, drop stop words.
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

// =============================================================================
// TfidfVectorizer - vocabulary fit over the corpus, lexical match
// =============================================================================

/// Term-frequency / inverse-document-frequency vectorizer.
///
/// The vocabulary is learned from the corpus documents once; queries are
/// projected onto it. Query terms outside the vocabulary contribute zero
/// weight, so a query sharing no vocabulary with the corpus produces an
/// all-zero vector.
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

impl Vectorizer for TfidfVectorizer {
    fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(HavenError::EmptyCorpus);
        }

        let n_docs = documents.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let unique: HashSet<String> = tokenize(doc).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Alphabetical vocabulary order keeps fitting deterministic
        let mut terms: Vec<(String, usize)> = doc_freq.into_iter().collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        self.vocabulary = terms
            .iter()
            .enumerate()
            .map(|(idx, (term, _))| (term.clone(), idx))
            .collect();

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        self.idf = terms
            .iter()
            .map(|(_, df)| (((1 + n_docs) as f32) / ((1 + df) as f32)).ln() + 1.0)
            .collect();

        Ok(())
    }

    fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        if self.vocabulary.is_empty() {
            return Err(HavenError::Vectorization(
                "tfidf vectorizer has not been fit".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                vector[idx] += 1.0;
            }
        }

        for (idx, v) in vector.iter_mut().enumerate() {
            *v *= self.idf[idx];
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

// =============================================================================
// HashVectorizer - n-gram hashing, corpus-independent
// =============================================================================

/// Hashing vectorizer over character trigrams and word unigrams.
///
/// Needs no fitting, so unseen query vocabulary still lands near related
/// corpus text that shares character structure.
pub struct HashVectorizer {
    dim: usize,
}

impl Default for HashVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HashVectorizer {
    pub fn new() -> Self {
        Self { dim: HASH_DIM }
    }

    #[allow(dead_code)]
    pub fn with_dim(dim: usize) -> Self {
        Self { dim }
    }
}

impl Vectorizer for HashVectorizer {
    fn fit(&mut self, _documents: &[String]) -> Result<()> {
        // Stateless strategy; nothing to learn
        Ok(())
    }

    fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        let text = text.trim();
        let mut vector = vec![0.0f32; self.dim];

        // Character trigrams
        let chars: Vec<char> = text.chars().collect();
        for i in 0..chars.len().saturating_sub(2) {
            let trigram: String = chars[i..i + 3].iter().collect();
            let hash = md5_hash(&trigram);
            let idx = (hash % self.dim as u128) as usize;
            vector[idx] += 1.0;
        }

        // Word unigrams (weighted more than trigrams)
        for word in text.split_whitespace() {
            let hash = md5_hash(word);
            let idx = (hash % self.dim as u128) as usize;
            vector[idx] += 2.0;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}

/// Compute MD5 hash and return as u128
fn md5_hash(text: &str) -> u128 {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    u128::from_be_bytes(result.into())
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

// =============================================================================
// Cosine similarity
// =============================================================================

/// Compute cosine similarity between two vectors. A zero-magnitude vector
/// is orthogonal to everything, including when lengths mismatch.
pub fn cosine_similarity(vec_a: &[f32], vec_b: &[f32]) -> f64 {
    if vec_a.len() != vec_b.len() {
        return 0.0;
    }

    let dot: f32 = vec_a.iter().zip(vec_b.iter()).map(|(a, b)| a * b).sum();
    let norm_a: f32 = vec_a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = vec_b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)) as f64
    }
}
