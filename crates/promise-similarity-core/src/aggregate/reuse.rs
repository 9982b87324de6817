//! Cross-program reuse
//!
//! For every ordered pair of programs (row, column) the matrix holds how many
//! of the row's promises have at least one related promise in the column
//! scoring at or above the reuse threshold, and that count as a percentage of
//! the row's size.

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::promise::Program;
use crate::similarity::Similarities;

/// Marker for a cell with no value in the rendered table
const MISSING_CELL: &str = "-";

/// Row and column program labels of one matrix cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReuseKey {
    pub row: String,
    pub column: String,
}

impl ReuseKey {
    pub fn new(row: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
        }
    }
}

/// Reuse of one program in another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReuseStat {
    pub count: usize,
    /// `count * 100 / row size`, in [0, 100]
    pub percentage: f64,
}

/// Reuse counts for every ordered pair of programs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "ReuseRecord", from = "ReuseRecord")]
pub struct ReuseMatrix {
    programs: Vec<String>,
    cells: BTreeMap<ReuseKey, ReuseStat>,
}

/// Persisted shape: labels in program order, cells row by row
#[derive(Serialize, Deserialize)]
struct ReuseRecord {
    programs: Vec<String>,
    cells: Vec<ReuseCell>,
}

#[derive(Serialize, Deserialize)]
struct ReuseCell {
    row: String,
    column: String,
    count: usize,
    percentage: f64,
}

impl From<ReuseMatrix> for ReuseRecord {
    fn from(matrix: ReuseMatrix) -> Self {
        let cells = matrix
            .programs
            .iter()
            .flat_map(|row| matrix.programs.iter().map(move |column| (row, column)))
            .filter_map(|(row, column)| {
                matrix
                    .get(row, column)
                    .map(|stat| ReuseCell {
                        row: row.clone(),
                        column: column.clone(),
                        count: stat.count,
                        percentage: stat.percentage,
                    })
            })
            .collect();

        ReuseRecord {
            programs: matrix.programs,
            cells,
        }
    }
}

impl From<ReuseRecord> for ReuseMatrix {
    fn from(record: ReuseRecord) -> Self {
        let cells = record
            .cells
            .into_iter()
            .map(|cell| {
                (
                    ReuseKey::new(cell.row, cell.column),
                    ReuseStat {
                        count: cell.count,
                        percentage: cell.percentage,
                    },
                )
            })
            .collect();

        ReuseMatrix {
            programs: record.programs,
            cells,
        }
    }
}

impl ReuseMatrix {
    /// Program labels in corpus order
    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    pub fn get(&self, row: &str, column: &str) -> Option<&ReuseStat> {
        self.cells.get(&ReuseKey::new(row, column))
    }

    pub fn cells(&self) -> impl Iterator<Item = (&ReuseKey, &ReuseStat)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Percentage table: a blank corner cell and every label as header, then
    /// one row per program. Missing cells render as `-`.
    pub fn table(&self) -> Vec<Vec<String>> {
        let mut header = Vec::with_capacity(self.programs.len() + 1);
        header.push(String::new());
        header.extend(self.programs.iter().cloned());

        let mut table = vec![header];
        for row in &self.programs {
            let mut line = Vec::with_capacity(self.programs.len() + 1);
            line.push(row.clone());
            for column in &self.programs {
                line.push(match self.get(row, column) {
                    Some(stat) => stat.percentage.to_string(),
                    None => MISSING_CELL.to_string(),
                });
            }
            table.push(line);
        }
        table
    }
}

/// Build the reuse matrix from a promise similarity result
#[tracing::instrument(skip_all, fields(programs = programs.len(), threshold = threshold))]
pub fn reuse_matrix(similarities: &Similarities, programs: &[Program], threshold: f64) -> ReuseMatrix {
    let program_of: HashMap<usize, usize> = programs
        .iter()
        .enumerate()
        .flat_map(|(position, program)| program.members.iter().map(move |&m| (m, position)))
        .collect();

    // For each promise, the programs it has a qualifying match in
    let matched: HashMap<usize, HashSet<usize>> = similarities
        .iter()
        .map(|entry| {
            let columns = entry
                .related
                .iter()
                .filter(|related| related.index != entry.index && related.score >= threshold)
                .filter_map(|related| program_of.get(&related.index).copied())
                .collect();
            (entry.index, columns)
        })
        .collect();

    let counts: Vec<Vec<usize>> = programs
        .par_iter()
        .map(|row| {
            let mut counts = vec![0; programs.len()];
            for member in &row.members {
                if let Some(columns) = matched.get(member) {
                    for &column in columns {
                        counts[column] += 1;
                    }
                }
            }
            counts
        })
        .collect();

    let mut cells = BTreeMap::new();
    for (row, row_counts) in programs.iter().zip(&counts) {
        for (column, &count) in programs.iter().zip(row_counts) {
            let percentage = if row.is_empty() {
                0.0
            } else {
                count as f64 * 100.0 / row.len() as f64
            };
            cells.insert(
                ReuseKey::new(row.label.clone(), column.label.clone()),
                ReuseStat { count, percentage },
            );
        }
    }

    ReuseMatrix {
        programs: programs.iter().map(|program| program.label.clone()).collect(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::{group_programs, Promise};
    use crate::similarity::{DocumentSimilarity, Related};

    fn promises(specs: &[(&str, &str)]) -> Vec<Promise> {
        specs
            .iter()
            .enumerate()
            .map(|(index, &(promisor, period))| Promise {
                id: index as i64 + 100,
                index,
                promisor: promisor.to_string(),
                period: period.to_string(),
                body: String::new(),
            })
            .collect()
    }

    fn entry(index: usize, related: &[(usize, f64)]) -> DocumentSimilarity {
        DocumentSimilarity {
            index,
            related: related
                .iter()
                .map(|&(index, score)| Related { index, score })
                .collect(),
        }
    }

    #[test]
    fn test_counts_promises_not_pairs() {
        // 0 and 1 are Ap:2013, 2 and 3 are Ap:2017; 0 matches both 2 and 3
        let promises = promises(&[
            ("Ap", "2013"),
            ("Ap", "2013"),
            ("Ap", "2017"),
            ("Ap", "2017"),
        ]);
        let programs = group_programs(&promises);
        let similarities = Similarities::from_entries(vec![
            entry(0, &[(2, 0.9), (3, 0.8)]),
            entry(2, &[(0, 0.9)]),
            entry(3, &[(0, 0.8)]),
        ]);

        let matrix = reuse_matrix(&similarities, &programs, 0.7);
        let stat = matrix.get("Ap:2013", "Ap:2017").unwrap();
        assert_eq!(stat.count, 1);
        assert_eq!(stat.percentage, 50.0);

        let stat = matrix.get("Ap:2017", "Ap:2013").unwrap();
        assert_eq!(stat.count, 2);
        assert_eq!(stat.percentage, 100.0);

        assert_eq!(matrix.len(), 4);
        assert!(matrix
            .cells()
            .all(|(_, stat)| (0.0..=100.0).contains(&stat.percentage)));
    }

    #[test]
    fn test_self_pair_full_when_every_promise_matches_internally() {
        let promises = promises(&[("Sp", "2017"), ("Sp", "2017"), ("V", "2017")]);
        let programs = group_programs(&promises);
        let similarities =
            Similarities::from_entries(vec![entry(0, &[(1, 0.95)]), entry(1, &[(0, 0.95)])]);

        let matrix = reuse_matrix(&similarities, &programs, 0.7);
        assert_eq!(matrix.get("Sp:2017", "Sp:2017").unwrap().percentage, 100.0);
        assert_eq!(matrix.get("V:2017", "V:2017").unwrap().count, 0);
        assert_eq!(matrix.get("V:2017", "Sp:2017").unwrap().percentage, 0.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let promises = promises(&[("Ap", "2013"), ("H", "2013")]);
        let programs = group_programs(&promises);
        let similarities =
            Similarities::from_entries(vec![entry(0, &[(1, 0.7)]), entry(1, &[(0, 0.69)])]);

        let matrix = reuse_matrix(&similarities, &programs, 0.7);
        assert_eq!(matrix.get("Ap:2013", "H:2013").unwrap().count, 1);
        assert_eq!(matrix.get("H:2013", "Ap:2013").unwrap().count, 0);
    }

    #[test]
    fn test_table_layout() {
        let promises = promises(&[("Ap", "2013"), ("H", "2013")]);
        let programs = group_programs(&promises);
        let similarities = Similarities::from_entries(vec![entry(0, &[(1, 0.9)])]);

        let mut matrix = reuse_matrix(&similarities, &programs, 0.7);
        matrix.cells.remove(&ReuseKey::new("H:2013", "H:2013"));

        let table = matrix.table();
        assert_eq!(table[0], vec!["", "Ap:2013", "H:2013"]);
        assert_eq!(table[1], vec!["Ap:2013", "0", "100"]);
        assert_eq!(table[2], vec!["H:2013", "0", "-"]);
    }

    #[test]
    fn test_json_keeps_program_order() {
        let promises = promises(&[("V", "2017"), ("Ap", "2017")]);
        let programs = group_programs(&promises);
        let matrix = reuse_matrix(&Similarities::default(), &programs, 0.7);

        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(json["programs"], serde_json::json!(["V:2017", "Ap:2017"]));
        assert_eq!(json["cells"][0]["row"], "V:2017");
        assert_eq!(json["cells"][0]["column"], "V:2017");
        assert_eq!(json["cells"][1]["column"], "Ap:2017");

        let decoded: ReuseMatrix = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, matrix);
    }
}
