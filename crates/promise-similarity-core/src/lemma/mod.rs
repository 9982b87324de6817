//! Lemmatization boundary
//!
//! The pipeline only needs one lemma sequence per promise body, in input
//! order. Anything that can produce that sits behind [`LemmaProvider`].

mod obt;

use crate::error::{PromiseError, Result};

pub use obt::{parse_tagged_output, ObtTagger, SEPARATOR};

/// Produces lemma sequences for raw texts
pub trait LemmaProvider {
    /// Lemmatize every text. The result must have one sequence per input,
    /// in the same order.
    fn lemmatize(&self, texts: &[String]) -> Result<Vec<Vec<String>>>;
}

/// Fail unless there is exactly one lemma sequence per promise
pub fn check_alignment(promises: usize, lemmas: &[Vec<String>]) -> Result<()> {
    if promises != lemmas.len() {
        return Err(PromiseError::Alignment {
            promises,
            lemmas: lemmas.len(),
        });
    }
    Ok(())
}

/// Space-join each lemma sequence into an engine document
pub fn documents(lemmas: &[Vec<String>]) -> Vec<String> {
    lemmas.iter().map(|sentence| sentence.join(" ")).collect()
}
