//! Oslo-Bergen-Tagger subprocess
//!
//! Every body is written to a temp file on its own line, prefixed by a
//! separator word. `tag-bm.sh` emits one `<word>` line per token followed by
//! one or more tab-indented readings (`\t"lemma" tag tag ...`).

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use tempfile::NamedTempFile;

use super::LemmaProvider;
use crate::error::{PromiseError, Result};
use crate::trace_time;

/// Marker word written before each body. Other markers (e.g. `____`) change
/// how the tagger splits sentences.
pub const SEPARATOR: &str = "----";

const TAG_SCRIPT: &str = "tag-bm.sh";

static WORD_PATTERN: OnceLock<Regex> = OnceLock::new();
static READING_PATTERN: OnceLock<Regex> = OnceLock::new();

fn word_pattern() -> &'static Regex {
    WORD_PATTERN.get_or_init(|| Regex::new(r"^<word>(.+)</word>$").expect("word pattern is valid"))
}

fn reading_pattern() -> &'static Regex {
    READING_PATTERN
        .get_or_init(|| Regex::new(r#"^\t"(.+?)" (.+)$"#).expect("reading pattern is valid"))
}

/// Lemma provider backed by an Oslo-Bergen-Tagger installation
#[derive(Debug, Clone)]
pub struct ObtTagger {
    obt_path: PathBuf,
}

impl ObtTagger {
    pub fn new(obt_path: impl Into<PathBuf>) -> Self {
        Self {
            obt_path: obt_path.into(),
        }
    }

    pub fn obt_path(&self) -> &Path {
        &self.obt_path
    }

    fn script(&self) -> PathBuf {
        self.obt_path.join(TAG_SCRIPT)
    }

    fn write_input(texts: &[String]) -> Result<NamedTempFile> {
        let mut input = NamedTempFile::new()
            .map_err(|e| PromiseError::Tagger(format!("cannot create input file: {}", e)))?;

        for text in texts {
            // One body per line; embedded newlines would split a promise
            let line = text.replace(['\r', '\n'], " ");
            writeln!(input, "{} {}", SEPARATOR, line)?;
        }
        input.flush()?;

        Ok(input)
    }
}

impl LemmaProvider for ObtTagger {
    #[tracing::instrument(skip_all, fields(texts = texts.len(), obt = %self.obt_path.display()))]
    fn lemmatize(&self, texts: &[String]) -> Result<Vec<Vec<String>>> {
        let start = Instant::now();
        let input = Self::write_input(texts)?;
        let script = self.script();

        let mut child = Command::new(&script)
            .arg(input.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PromiseError::Tagger(format!("cannot run {}: {}", script.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PromiseError::Tagger("tagger stdout was not captured".to_string()))?;

        let parsed = parse_tagged_output(BufReader::new(stdout));

        let status = child
            .wait()
            .map_err(|e| PromiseError::Tagger(format!("waiting for tagger: {}", e)))?;
        if !status.success() {
            return Err(PromiseError::Tagger(format!(
                "{} exited with {}",
                script.display(),
                status
            )));
        }

        let lemmas = parsed?;
        trace_time!(start, "obt_tag", sentences = lemmas.len());
        Ok(lemmas)
    }
}

struct TaggedWord {
    form: String,
    lemma: Option<String>,
}

impl TaggedWord {
    fn into_lemma(self) -> String {
        self.lemma.unwrap_or_else(|| self.form.to_lowercase())
    }
}

fn finish(sentence: Vec<TaggedWord>) -> Vec<String> {
    sentence.into_iter().map(TaggedWord::into_lemma).collect()
}

/// Parse tagger output into one lemma sequence per separator.
///
/// Each separator word opens a new sentence, including empty ones, so the
/// result lines up with the input bodies. Words before the first separator
/// are ignored. When a word has several readings the last one wins; a word
/// with no reading keeps its lowercased form.
pub fn parse_tagged_output<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut sentences: Vec<Vec<String>> = Vec::new();
    let mut current: Option<Vec<TaggedWord>> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');

        if let Some(word) = word_pattern().captures(line) {
            let form = &word[1];
            if form == SEPARATOR {
                if let Some(sentence) = current.take() {
                    sentences.push(finish(sentence));
                }
                current = Some(Vec::new());
            } else if let Some(sentence) = current.as_mut() {
                sentence.push(TaggedWord {
                    form: form.to_string(),
                    lemma: None,
                });
            }
            continue;
        }

        if let Some(reading) = reading_pattern().captures(line) {
            let lemma = &reading[1];
            if lemma == SEPARATOR {
                continue;
            }
            if let Some(word) = current.as_mut().and_then(|sentence| sentence.last_mut()) {
                word.lemma = Some(lemma.to_string());
            }
        }
    }

    if let Some(sentence) = current {
        sentences.push(finish(sentence));
    }

    Ok(sentences)
}
