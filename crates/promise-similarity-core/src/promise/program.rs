use std::collections::HashMap;

use super::Promise;

/// All promises from one promisor in one period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// URL and filesystem safe key derived from promisor and period
    pub slug: String,
    /// Human-readable `promisor:period` label
    pub label: String,
    pub promisor: String,
    pub period: String,
    /// Corpus indices of the member promises, in load order
    pub members: Vec<usize>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Slug for a (promisor, period) pair
pub fn program_slug(promisor: &str, period: &str) -> String {
    slug::slugify(format!("{}-{}", promisor, period))
}

/// Label for a (promisor, period) pair as used in the reuse matrix
pub fn program_label(promisor: &str, period: &str) -> String {
    format!("{}:{}", promisor, period)
}

/// Group promises into programs, ordered by first appearance in the corpus
pub fn group_programs(promises: &[Promise]) -> Vec<Program> {
    let mut programs: Vec<Program> = Vec::new();
    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();

    for promise in promises {
        let key = (promise.promisor.as_str(), promise.period.as_str());
        let position = *positions.entry(key).or_insert_with(|| {
            programs.push(Program {
                slug: program_slug(&promise.promisor, &promise.period),
                label: program_label(&promise.promisor, &promise.period),
                promisor: promise.promisor.clone(),
                period: promise.period.clone(),
                members: Vec::new(),
            });
            programs.len() - 1
        });
        programs[position].members.push(promise.index);
    }

    programs
}
