use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::Deserialize;

use crate::error::{RaceError, Result};

static PASSAGE_DIR: Dir = include_dir!("src/passages");

pub const DEFAULT_CORPUS: &str = "quotes";

/// Supplies the text the local player has to reproduce.
pub trait PassageSource: Send {
    fn next(&mut self) -> String;
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Corpus {
    pub name: String,
    pub passages: Vec<String>,
}

impl Corpus {
    /// Load one of the corpora bundled under `src/passages`
    pub fn bundled(name: &str) -> Result<Self> {
        let file = PASSAGE_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| RaceError::MissingCorpus(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| RaceError::MissingCorpus(name.to_string()))?;
        Self::from_json(contents)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let corpus: Corpus = serde_json::from_str(data)?;
        if corpus.passages.is_empty() {
            return Err(RaceError::EmptyCorpus(corpus.name));
        }
        Ok(corpus)
    }
}

/// Uniform draw from a corpus. Draws are independent and never run out.
pub struct RandomPassages<R> {
    corpus: Corpus,
    rng: R,
}

impl<R: Rng> RandomPassages<R> {
    pub fn new(corpus: Corpus, rng: R) -> Self {
        Self { corpus, rng }
    }
}

impl<R: Rng + Send> PassageSource for RandomPassages<R> {
    fn next(&mut self) -> String {
        let idx = self.rng.gen_range(0..self.corpus.passages.len());
        self.corpus.passages[idx].clone()
    }
}

/// Always hands out the same passage (custom `--passage` text)
#[derive(Debug, Clone)]
pub struct FixedPassage(pub String);

impl PassageSource for FixedPassage {
    fn next(&mut self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn bundled_quotes_load() {
        let corpus = Corpus::bundled(DEFAULT_CORPUS).unwrap();

        assert_eq!(corpus.name, "quotes");
        assert_eq!(corpus.passages.len(), 5);
        assert!(corpus
            .passages
            .contains(&"The quick brown fox jumps over the lazy dog.".to_string()));
    }

    #[test]
    fn unknown_corpus_is_an_error() {
        assert_matches!(
            Corpus::bundled("klingon"),
            Err(RaceError::MissingCorpus(name)) if name == "klingon"
        );
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let json = r#"{ "name": "nothing", "passages": [] }"#;
        assert_matches!(Corpus::from_json(json), Err(RaceError::EmptyCorpus(_)));
    }

    #[test]
    fn malformed_corpus_is_rejected() {
        assert_matches!(
            Corpus::from_json("{ not json"),
            Err(RaceError::CorpusFormat(_))
        );
    }

    #[test]
    fn random_passages_never_exhaust() {
        let corpus = Corpus::bundled(DEFAULT_CORPUS).unwrap();
        let mut source = RandomPassages::new(corpus.clone(), StdRng::seed_from_u64(7));

        for _ in 0..200 {
            let passage = source.next();
            assert!(corpus.passages.contains(&passage));
        }
    }

    #[test]
    fn random_passages_cover_the_corpus() {
        let corpus = Corpus::bundled(DEFAULT_CORPUS).unwrap();
        let mut source = RandomPassages::new(corpus.clone(), StdRng::seed_from_u64(42));

        let seen: std::collections::HashSet<String> = (0..500).map(|_| source.next()).collect();
        assert_eq!(seen.len(), corpus.passages.len());
    }

    #[test]
    fn fixed_passage_repeats() {
        let mut source = FixedPassage("ab".to_string());
        assert_eq!(source.next(), "ab");
        assert_eq!(source.next(), "ab");
    }
}
