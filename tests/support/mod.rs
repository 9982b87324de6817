use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const CORPUS: &str = "id,promisor,period,body\n\
101,Ap,2017,Styrke skolen og lærerne\n\
102,Ap,2017,Styrke skolen og lærerne\n\
201,H,2017,Bygge ny jernbane\n\
202,H,2013,Bygge ny jernbane\n\
301,Sp,2017,Bevare bondene\n";

pub const STOP_WORDS: &str = "og 48213\nny 1220\n";

/// Lemmas lined up with `CORPUS`
pub const LEMMAS: &str = r#"[
  ["styrke", "skole", "og", "lærer"],
  ["styrke", "skole", "og", "lærer"],
  ["bygge", "ny", "jernbane"],
  ["bygge", "ny", "jernbane"],
  ["bevare", "bonde"]
]"#;

/// Get a Command for promise-similarity with no environment overrides
pub fn promise_similarity() -> Command {
    let mut cmd = cargo_bin_cmd!("promise-similarity");
    for var in [
        "PROMISE_SIMILARITY_CONFIG",
        "PROMISE_SIMILARITY_DATA_DIR",
        "PROMISE_SIMILARITY_OBT_PATH",
        "PROMISE_SIMILARITY_THRESHOLD",
        "PROMISE_SIMILARITY_DUPLICATE_THRESHOLD",
        "PROMISE_SIMILARITY_TIMEOUT",
        "PROMISE_SIMILARITY_RETRIES",
        "PROMISE_SIMILARITY_LOG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Data directory with the corpus, stop words and cached lemmas, so no
/// tagger or network access is needed
pub fn seed_data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "promises.csv", CORPUS);
    write(dir.path(), "ton_idf.txt", STOP_WORDS);
    write(dir.path(), "lemmas.json", LEMMAS);
    dir
}

pub fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Command pointed at `dir`
#[allow(dead_code)]
pub fn in_data_dir(dir: &TempDir) -> Command {
    let mut cmd = promise_similarity();
    cmd.arg("--data-dir").arg(dir.path());
    cmd
}
