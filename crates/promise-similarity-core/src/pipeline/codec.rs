//! On-disk encodings for stage artifacts

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encodes and decodes one artifact type
pub trait ArtifactCodec<T> {
    fn encode(&self, value: &T, writer: &mut dyn Write) -> Result<()>;
    fn decode(&self, reader: &mut dyn Read) -> Result<T>;
}

/// Compact JSON, UTF-8 kept as is
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> ArtifactCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T, writer: &mut dyn Write) -> Result<()> {
        serde_json::to_writer(&mut *writer, value)?;
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<T> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Tab-separated rows with a header taken from the row type's field names
#[derive(Debug, Clone, Copy, Default)]
pub struct TsvCodec;

impl<R> ArtifactCodec<Vec<R>> for TsvCodec
where
    R: Serialize + DeserializeOwned,
{
    fn encode(&self, rows: &Vec<R>, writer: &mut dyn Write) -> Result<()> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(&mut *writer);
        for row in rows {
            tsv.serialize(row)?;
        }
        tsv.flush()?;
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Vec<R>> {
        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(reader);
        let mut rows = Vec::new();
        for row in tsv.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

/// Tab-separated string cells with no header handling; the first row is
/// whatever the producer put there
#[derive(Debug, Clone, Copy, Default)]
pub struct TableCodec;

impl ArtifactCodec<Vec<Vec<String>>> for TableCodec {
    fn encode(&self, rows: &Vec<Vec<String>>, writer: &mut dyn Write) -> Result<()> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_writer(&mut *writer);
        for row in rows {
            tsv.write_record(row)?;
        }
        tsv.flush()?;
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Vec<Vec<String>>> {
        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut rows = Vec::new();
        for record in tsv.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
        score: Option<f64>,
        body: String,
    }

    #[test]
    fn test_tsv_header_and_empty_option() {
        let rows = vec![
            Row {
                id: 1,
                score: None,
                body: "Styrke skolen".to_string(),
            },
            Row {
                id: 2,
                score: Some(0.5),
                body: "Bygge\tjernbane".to_string(),
            },
        ];

        let mut buffer = Vec::new();
        TsvCodec.encode(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("id\tscore\tbody\n1\t\tStyrke skolen\n"));

        let decoded: Vec<Row> = TsvCodec.decode(&mut buffer.as_slice()).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_table_blank_corner_cell() {
        let table = vec![
            vec!["".to_string(), "Ap:2017".to_string()],
            vec!["Ap:2017".to_string(), "100".to_string()],
        ];

        let mut buffer = Vec::new();
        TableCodec.encode(&table, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer.clone()).unwrap(),
            "\tAp:2017\nAp:2017\t100\n"
        );
        assert_eq!(TableCodec.decode(&mut buffer.as_slice()).unwrap(), table);
    }

    #[test]
    fn test_json_keeps_utf8() {
        let mut buffer = Vec::new();
        JsonCodec
            .encode(&vec![vec!["høyre".to_string()]], &mut buffer)
            .unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), r#"[["høyre"]]"#);
    }
}
