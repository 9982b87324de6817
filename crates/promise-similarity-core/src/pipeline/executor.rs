//! Full pipeline run
//!
//! Each stage goes through [`materialize`]: the artifact is reused unless it
//! is missing, its stage is invalidated, or an upstream stage was recomputed
//! in this run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::codec::{JsonCodec, TableCodec, TsvCodec};
use super::materialize::{materialize, materialize_file, Materialized, Outcome};
use super::paths::ArtifactPaths;
use super::stage::{Invalidation, Stage};
use crate::aggregate::{
    consolidate, detail_report, program_similarities, reuse_matrix, ConsolidatedPromise,
    DetailRow, ProgramSimilarity, ReuseMatrix,
};
use crate::config::{DetailFilter, PipelineConfig};
use crate::error::{PromiseError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::lemma::{check_alignment, documents, LemmaProvider, ObtTagger};
use crate::promise::{group_programs, read_promises, Program, Promise};
use crate::similarity::{
    duplicate_report, find_duplicates, DuplicateRow, Similarities, SimilarityEngine,
};
use crate::text::read_stop_words;
use crate::trace_time;

/// Outcome of one stage in a run
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: Outcome,
    pub artifact: PathBuf,
}

/// One written detail report
#[derive(Debug, Clone, Serialize)]
pub struct DetailSummary {
    pub slug: String,
    pub path: PathBuf,
    pub rows: usize,
    pub outcome: Outcome,
}

/// What a full run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub data_dir: PathBuf,
    pub promises: usize,
    pub programs: usize,
    /// Promises with at least one related promise
    pub similar_promises: usize,
    pub similarity_pairs: usize,
    pub duplicates: usize,
    pub related_programs: usize,
    pub reuse_cells: usize,
    pub details: Vec<DetailSummary>,
    pub stages: Vec<StageReport>,
}

impl RunSummary {
    /// Number of stages that were computed rather than loaded
    pub fn computed(&self) -> usize {
        self.stages
            .iter()
            .filter(|report| report.outcome == Outcome::Computed)
            .count()
    }
}

/// Drives the staged pipeline against one data directory
pub struct Executor {
    config: PipelineConfig,
    paths: ArtifactPaths,
    invalidation: Invalidation,
    lemma_provider: Box<dyn LemmaProvider>,
    fetcher: Box<dyn Fetcher>,
}

impl Executor {
    pub fn new(
        config: PipelineConfig,
        invalidation: Invalidation,
        lemma_provider: Box<dyn LemmaProvider>,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        let paths = ArtifactPaths::new(config.data_dir.clone());
        Self {
            config,
            paths,
            invalidation,
            lemma_provider,
            fetcher,
        }
    }

    /// Executor backed by the Oslo-Bergen-Tagger and HTTP downloads
    pub fn from_config(config: PipelineConfig, invalidation: Invalidation) -> Self {
        let tagger = ObtTagger::new(config.obt_path.clone());
        let fetcher = HttpFetcher::new(&config.sources);
        Self::new(config, invalidation, Box::new(tagger), Box::new(fetcher))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// A stage recomputes when invalidated or when anything it reads was
    /// recomputed this run
    fn forces(&self, stage: Stage, upstream: &[Outcome]) -> bool {
        self.invalidation.forces(stage) || upstream.contains(&Outcome::Computed)
    }

    /// Download the corpus if needed and parse it
    #[tracing::instrument(skip_all)]
    pub fn load_corpus(&self) -> Result<Materialized<Vec<Promise>>> {
        let path = self.paths.promises();
        let url = &self.config.sources.promises_url;
        let outcome = materialize_file(&path, self.forces(Stage::Download, &[]), |dest| {
            tracing::info!(url = %url, "downloading promises");
            self.fetcher.fetch(url, dest)
        })?;

        let promises = read_promises(&path)?;

        Ok(Materialized {
            value: promises,
            outcome,
        })
    }

    /// Download the stop-word list if needed and parse it
    #[tracing::instrument(skip_all)]
    pub fn stop_words(&self) -> Result<Materialized<HashSet<String>>> {
        let path = self.paths.stop_words();
        let url = &self.config.sources.stop_words_url;
        let outcome = materialize_file(&path, self.forces(Stage::StopWords, &[]), |dest| {
            tracing::info!(url = %url, "downloading stop words");
            self.fetcher.fetch(url, dest)
        })?;

        let words = read_stop_words(&path)?;
        tracing::debug!(count = words.len(), "read stop words");

        Ok(Materialized {
            value: words,
            outcome,
        })
    }

    /// Lemmatize every promise body; the result must line up with the corpus
    #[tracing::instrument(skip_all, fields(promises = corpus.value.len()))]
    pub fn lemmatize(
        &self,
        corpus: &Materialized<Vec<Promise>>,
    ) -> Result<Materialized<Vec<Vec<String>>>> {
        let promises = &corpus.value;
        let force = self.forces(Stage::Tag, &[corpus.outcome]);

        let lemmas = materialize(&self.paths.lemmas(), force, &JsonCodec, || {
            tracing::info!("tagging promises");
            let start = Instant::now();
            let bodies: Vec<String> = promises.iter().map(|p| p.body.clone()).collect();
            let lemmas = self.lemma_provider.lemmatize(&bodies)?;
            check_alignment(promises.len(), &lemmas)?;
            trace_time!(start, "lemmatize");
            Ok(lemmas)
        })?;

        if lemmas.outcome == Outcome::Cached {
            tracing::info!("read lemmas");
            check_alignment(promises.len(), &lemmas.value)?;
        }

        Ok(lemmas)
    }

    /// Promise-level similarity at the configured threshold
    #[tracing::instrument(skip_all)]
    pub fn promise_similarities(
        &self,
        corpus: &Materialized<Vec<Promise>>,
        lemmas: &Materialized<Vec<Vec<String>>>,
    ) -> Result<Materialized<Similarities>> {
        let path = self.paths.similarities();
        let force = self.forces(Stage::Similarities, &[lemmas.outcome]);
        let selection = self.config.promise_selection();

        let similarities = materialize(&path, force, &JsonCodec, || {
            tracing::info!(?selection, "calculating similarity");
            SimilarityEngine::new(selection).compute(&documents(&lemmas.value))
        })?;

        if let Some(max) = similarities.value.max_index() {
            if max >= corpus.value.len() {
                return Err(PromiseError::StaleArtifact {
                    path,
                    reason: format!(
                        "references promise index {} but the corpus has {} promises",
                        max,
                        corpus.value.len()
                    ),
                });
            }
        }

        tracing::debug!(
            sources = similarities.value.len(),
            pairs = similarities.value.pair_count(),
            outcome = ?similarities.outcome,
            "promise similarities ready"
        );
        Ok(similarities)
    }

    /// Same-program pairs at or above the duplicate threshold
    #[tracing::instrument(skip_all)]
    pub fn duplicates(
        &self,
        corpus: &Materialized<Vec<Promise>>,
        similarities: &Materialized<Similarities>,
    ) -> Result<Materialized<Vec<DuplicateRow>>> {
        let force = self.forces(Stage::Duplicates, &[similarities.outcome]);
        let rows = materialize(&self.paths.duplicates(), force, &TsvCodec, || {
            tracing::info!("writing duplicate report");
            let candidates = find_duplicates(
                &similarities.value,
                &corpus.value,
                self.config.similarity.duplicate_threshold,
            );
            tracing::info!(count = candidates.len(), "possible duplicates");
            Ok(duplicate_report(
                &candidates,
                &corpus.value,
                &self.config.review_url_template,
            ))
        })?;
        Ok(rows)
    }

    /// Published result keyed by promise id
    #[tracing::instrument(skip_all)]
    pub fn consolidate(
        &self,
        corpus: &Materialized<Vec<Promise>>,
        similarities: &Materialized<Similarities>,
    ) -> Result<Materialized<Vec<ConsolidatedPromise>>> {
        let force = self.forces(Stage::Consolidated, &[similarities.outcome]);
        materialize(&self.paths.result(), force, &JsonCodec, || {
            tracing::info!("writing result");
            Ok(consolidate(&similarities.value, &corpus.value))
        })
    }

    /// Whole-program similarity using the stop-word list
    #[tracing::instrument(skip_all, fields(programs = programs.len()))]
    pub fn program_similarities(
        &self,
        corpus: &Materialized<Vec<Promise>>,
        programs: &[Program],
        stop_words: &Materialized<HashSet<String>>,
    ) -> Result<Materialized<Vec<ProgramSimilarity>>> {
        let force = self.forces(
            Stage::ProgramSimilarities,
            &[corpus.outcome, stop_words.outcome],
        );
        materialize(&self.paths.program_similarities(), force, &JsonCodec, || {
            tracing::info!("calculating program similarities");
            program_similarities(
                &corpus.value,
                programs,
                self.config.similarity.program_top,
                Some(&stop_words.value),
            )
        })
    }

    /// Reuse matrix and its percentage table
    #[tracing::instrument(skip_all, fields(programs = programs.len()))]
    pub fn program_reuse(
        &self,
        programs: &[Program],
        similarities: &Materialized<Similarities>,
    ) -> Result<Materialized<ReuseMatrix>> {
        let force = self.forces(Stage::ProgramReuse, &[similarities.outcome]);
        let threshold = self.config.reuse_threshold();

        let matrix = materialize(&self.paths.program_reuse(), force, &JsonCodec, || {
            tracing::info!(threshold, "calculating program reuse");
            Ok(reuse_matrix(&similarities.value, programs, threshold))
        })?;

        materialize(
            &self.paths.program_reuse_table(),
            self.forces(Stage::ProgramReuse, &[matrix.outcome]),
            &TableCodec,
            || Ok(matrix.value.table()),
        )?;

        Ok(matrix)
    }

    /// One detail report
    #[tracing::instrument(skip_all, fields(promisor = %filter.promisor))]
    pub fn details(
        &self,
        corpus: &Materialized<Vec<Promise>>,
        similarities: &Materialized<Similarities>,
        filter: &DetailFilter,
    ) -> Result<DetailSummary> {
        let slug = filter.slug();
        let path = self.paths.details(&slug);
        let force = self.forces(Stage::Details, &[similarities.outcome]);

        let rows: Materialized<Vec<DetailRow>> = materialize(&path, force, &TsvCodec, || {
            tracing::info!(slug = %slug, "writing detail report");
            Ok(detail_report(
                &similarities.value,
                &corpus.value,
                filter,
                &self.config.review_url_template,
            ))
        })?;

        Ok(DetailSummary {
            slug,
            path,
            rows: rows.value.len(),
            outcome: rows.outcome,
        })
    }

    /// Corpus, lemmas and promise similarities: the inputs of every aggregate
    fn promise_stages(
        &self,
        stages: &mut Vec<StageReport>,
    ) -> Result<(Materialized<Vec<Promise>>, Materialized<Similarities>)> {
        let corpus = self.load_corpus()?;
        stages.push(self.report(Stage::Download, corpus.outcome, self.paths.promises()));

        let lemmas = self.lemmatize(&corpus)?;
        stages.push(self.report(Stage::Tag, lemmas.outcome, self.paths.lemmas()));

        let similarities = self.promise_similarities(&corpus, &lemmas)?;
        stages.push(self.report(
            Stage::Similarities,
            similarities.outcome,
            self.paths.similarities(),
        ));

        Ok((corpus, similarities))
    }

    fn report(&self, stage: Stage, outcome: Outcome, artifact: PathBuf) -> StageReport {
        if outcome == Outcome::Cached {
            tracing::info!(stage = %stage, "cached");
        }
        StageReport {
            stage,
            outcome,
            artifact,
        }
    }

    /// Run every stage in order
    #[tracing::instrument(skip_all, fields(data_dir = %self.paths.data_dir().display()))]
    pub fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        let started_at = Utc::now();
        let start = Instant::now();
        let mut stages = Vec::new();

        let (corpus, similarities) = self.promise_stages(&mut stages)?;

        let duplicates = self.duplicates(&corpus, &similarities)?;
        stages.push(self.report(
            Stage::Duplicates,
            duplicates.outcome,
            self.paths.duplicates(),
        ));

        let result = self.consolidate(&corpus, &similarities)?;
        stages.push(self.report(Stage::Consolidated, result.outcome, self.paths.result()));

        let programs = group_programs(&corpus.value);

        let stop_words = self.stop_words()?;
        stages.push(self.report(
            Stage::StopWords,
            stop_words.outcome,
            self.paths.stop_words(),
        ));

        let program_similarities = self.program_similarities(&corpus, &programs, &stop_words)?;
        stages.push(self.report(
            Stage::ProgramSimilarities,
            program_similarities.outcome,
            self.paths.program_similarities(),
        ));

        let reuse = self.program_reuse(&programs, &similarities)?;
        stages.push(self.report(
            Stage::ProgramReuse,
            reuse.outcome,
            self.paths.program_reuse(),
        ));

        let mut details = Vec::with_capacity(self.config.detail_reports.len());
        for filter in &self.config.detail_reports {
            let summary = self.details(&corpus, &similarities, filter)?;
            stages.push(self.report(Stage::Details, summary.outcome, summary.path.clone()));
            details.push(summary);
        }

        trace_time!(start, "pipeline_run");

        let summary = RunSummary {
            started_at,
            data_dir: self.paths.data_dir().to_path_buf(),
            promises: corpus.value.len(),
            programs: programs.len(),
            similar_promises: similarities.value.len(),
            similarity_pairs: similarities.value.pair_count(),
            duplicates: duplicates
                .value
                .iter()
                .filter(|row| row.original.is_empty())
                .count(),
            related_programs: program_similarities.value.len(),
            reuse_cells: reuse.value.len(),
            details,
            stages,
        };

        tracing::info!(
            promises = summary.promises,
            computed = summary.computed(),
            "run complete"
        );
        Ok(summary)
    }

    /// Produce a single detail report, running the promise stages it needs
    #[tracing::instrument(skip_all, fields(promisor = %filter.promisor))]
    pub fn run_details(&self, filter: &DetailFilter) -> Result<DetailSummary> {
        self.config.validate()?;
        if filter.promisor.trim().is_empty() {
            crate::bail_invalid!("detail report promisor", "(empty)");
        }

        let mut stages = Vec::new();
        let (corpus, similarities) = self.promise_stages(&mut stages)?;

        if !corpus.value.iter().any(|p| p.promisor == filter.promisor) {
            tracing::warn!(promisor = %filter.promisor, "no promises from this promisor");
        }

        self.details(&corpus, &similarities, filter)
    }
}
