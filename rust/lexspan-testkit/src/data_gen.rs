//! Seeded random corpora.

use crate::corpus::{Corpus, CorpusBuilder};

/// Vocabulary small enough that every term occurs many times per document.
pub const SMALL_VOCABULARY: &[&str] = &["a", "b", "c", "d"];

/// Shape of a generated corpus.
#[derive(Debug, Clone)]
pub struct RandomCorpusConfig {
    pub docs: usize,
    pub max_len: usize,
    pub vocabulary: Vec<String>,
    /// Chance in percent that a position carries a second annotation.
    pub second_annotation_pct: u8,
}

impl Default for RandomCorpusConfig {
    fn default() -> Self {
        RandomCorpusConfig {
            docs: 20,
            max_len: 24,
            vocabulary: SMALL_VOCABULARY.iter().map(|s| s.to_string()).collect(),
            second_annotation_pct: 25,
        }
    }
}

/// Generates a corpus in `field` from `seed`.
///
/// Every document is partitioned into `<>:s` sentences of one to five tokens,
/// and carries a few `<>:np` elements of one to three tokens that may nest in
/// or cross sentences. Documents may be empty.
pub fn random_corpus(seed: u64, field: &str, config: &RandomCorpusConfig) -> Corpus {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut builder = Corpus::builder(field);
    for _ in 0..config.docs {
        let len = rng.usize(0..=config.max_len);
        let text = (0..len)
            .map(|_| position(&mut rng, config))
            .collect::<Vec<_>>()
            .join(" ");
        builder.doc(&text);
        add_elements(&mut rng, &mut builder, len as u32);
    }
    builder.build()
}

fn position(rng: &mut fastrand::Rng, config: &RandomCorpusConfig) -> String {
    let first = rng.usize(0..config.vocabulary.len());
    let mut token = config.vocabulary[first].clone();
    if rng.u8(0..100) < config.second_annotation_pct {
        let second = rng.usize(0..config.vocabulary.len());
        if second != first {
            token.push('|');
            token.push_str(&config.vocabulary[second]);
        }
    }
    token
}

fn add_elements(rng: &mut fastrand::Rng, builder: &mut CorpusBuilder, len: u32) {
    let mut start = 0;
    while start < len {
        let end = (start + rng.u32(1..=5)).min(len);
        builder.element("<>:s", start, end);
        start = end;
    }
    if len == 0 {
        return;
    }
    for _ in 0..rng.u32(0..=len / 3) {
        let start = rng.u32(0..len);
        let end = (start + rng.u32(1..=3)).min(len);
        builder.element("<>:np", start, end);
    }
}
