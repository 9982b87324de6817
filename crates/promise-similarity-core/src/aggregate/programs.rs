use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::promise::{Program, Promise};
use crate::similarity::{Selection, SimilarityEngine};

/// A related program in the program similarity artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedProgram {
    pub slug: String,
    pub score: f64,
}

/// Programs most similar to one program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSimilarity {
    pub slug: String,
    pub related: Vec<RelatedProgram>,
}

/// One document per program slug. Pairs whose labels slugify alike
/// ("Høyre" and "Hoyre") share a document.
fn slug_documents(promises: &[Promise], programs: &[Program]) -> Vec<(String, String)> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for program in programs {
        let position = *positions.entry(program.slug.as_str()).or_insert_with(|| {
            groups.push((program.slug.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[position].1.extend(&program.members);
    }

    groups
        .into_iter()
        .map(|(slug, mut members)| {
            members.sort_unstable();
            let text = members
                .iter()
                .map(|&index| promises[index].body.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            (slug, text)
        })
        .collect()
}

/// Compare whole programs: the bodies of each program slug are joined into
/// one document and ranked with `Top(top)`.
#[tracing::instrument(skip_all, fields(programs = programs.len(), top = top))]
pub fn program_similarities(
    promises: &[Promise],
    programs: &[Program],
    top: usize,
    stop_words: Option<&HashSet<String>>,
) -> Result<Vec<ProgramSimilarity>> {
    let (slugs, documents): (Vec<String>, Vec<String>) =
        slug_documents(promises, programs).into_iter().unzip();

    let engine = SimilarityEngine::new(Selection::Top(top));
    let similarities = match stop_words {
        Some(words) => engine.with_stop_words(words).compute(&documents)?,
        None => engine.compute(&documents)?,
    };

    Ok(similarities
        .iter()
        .map(|entry| ProgramSimilarity {
            slug: slugs[entry.index].clone(),
            related: entry
                .related
                .iter()
                .map(|related| RelatedProgram {
                    slug: slugs[related.index].clone(),
                    score: related.score,
                })
                .collect(),
        })
        .collect())
}
