//! Pipeline stages and per-run cache invalidation

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromiseError;

/// A cacheable pipeline stage. Names match the `--no-cache` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Download,
    StopWords,
    Tag,
    Similarities,
    #[serde(rename = "result")]
    Consolidated,
    Duplicates,
    ProgramSimilarities,
    ProgramReuse,
    Details,
}

impl Stage {
    /// Every stage in run order
    pub const ALL: [Stage; 9] = [
        Stage::Download,
        Stage::StopWords,
        Stage::Tag,
        Stage::Similarities,
        Stage::Consolidated,
        Stage::Duplicates,
        Stage::ProgramSimilarities,
        Stage::ProgramReuse,
        Stage::Details,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::StopWords => "stop_words",
            Stage::Tag => "tag",
            Stage::Similarities => "similarities",
            Stage::Consolidated => "result",
            Stage::Duplicates => "duplicates",
            Stage::ProgramSimilarities => "program_similarities",
            Stage::ProgramReuse => "program_reuse",
            Stage::Details => "details",
        }
    }

    fn valid_names() -> String {
        Stage::ALL
            .iter()
            .map(Stage::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = PromiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.name() == normalized)
            .ok_or_else(|| {
                PromiseError::UsageError(format!(
                    "unknown stage '{}' (expected one of: all, {})",
                    s,
                    Stage::valid_names()
                ))
            })
    }
}

/// Stages whose cached artifacts are ignored for this run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    stages: BTreeSet<Stage>,
}

impl Invalidation {
    /// Use every cached artifact
    pub fn none() -> Self {
        Self::default()
    }

    /// Recompute everything
    pub fn all() -> Self {
        Self {
            stages: Stage::ALL.iter().copied().collect(),
        }
    }

    /// Parse stage names; `all` forces every stage
    pub fn from_names<I, S>(names: I) -> crate::error::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stages = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().eq_ignore_ascii_case("all") {
                return Ok(Self::all());
            }
            stages.insert(name.parse::<Stage>()?);
        }
        Ok(Self { stages })
    }

    pub fn with(mut self, stage: Stage) -> Self {
        self.stages.insert(stage);
        self
    }

    /// True when `stage` must be recomputed even if its artifact exists
    pub fn forces(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
            assert_eq!(stage.to_string(), stage.name());
        }
    }

    #[test]
    fn test_stage_parse_accepts_dashes() {
        assert_eq!(
            "program-reuse".parse::<Stage>().unwrap(),
            Stage::ProgramReuse
        );
    }

    #[test]
    fn test_unknown_stage_is_usage_error() {
        let err = "lemmas".parse::<Stage>().unwrap_err();
        assert!(matches!(err, PromiseError::UsageError(_)));
        assert!(err.to_string().contains("stop_words"));
    }

    #[test]
    fn test_invalidation_from_names() {
        let invalidation = Invalidation::from_names(["tag", "similarities"]).unwrap();
        assert!(invalidation.forces(Stage::Tag));
        assert!(invalidation.forces(Stage::Similarities));
        assert!(!invalidation.forces(Stage::Download));
    }

    #[test]
    fn test_invalidation_all() {
        let invalidation = Invalidation::from_names(["tag", "all"]).unwrap();
        assert!(Stage::ALL.iter().all(|stage| invalidation.forces(*stage)));
        assert!(Invalidation::none().stages().next().is_none());
    }

    #[test]
    fn test_stage_serializes_as_cli_name() {
        let json = serde_json::to_string(&Stage::Consolidated).unwrap();
        assert_eq!(json, "\"result\"");
        let json = serde_json::to_string(&Stage::StopWords).unwrap();
        assert_eq!(json, "\"stop_words\"");
    }
}
