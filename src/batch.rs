// 📦 Batch Processing - CSV of students in, CSV of registry codes out
// Each row is validated and coded on its own; one bad row never stops the run.

use crate::code::generate;
use crate::validation::{parse_birth_date, InputValidator, RawIdentity};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// One input row. The birth date stays text so a malformed date is a row error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchRow {
    pub surname: String,
    pub given_name: String,
    pub patronymic: String,
    pub birth_date: String,
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// 1-based position in the source: CSV line (header is line 1) or array index + 1
    pub line: usize,
    pub surname: String,
    pub given_name: String,
    pub patronymic: String,
    pub birth_date: String,
    pub group_id: String,
    /// Empty when the row was rejected
    pub code: String,
    /// Empty when a code was generated
    pub error: String,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        !self.code.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub generated: usize,
    pub rejected: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchResult]) -> Self {
        let generated = results.iter().filter(|r| r.is_ok()).count();
        BatchSummary {
            total: results.len(),
            generated,
            rejected: results.len() - generated,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} codes generated, {} rejected",
            self.total, self.generated, self.rejected
        )
    }
}

/// Columns every input file must carry in its header
pub const COLUMNS: [&str; 5] = ["surname", "given_name", "patronymic", "birth_date", "group_id"];

/// A row as read from its source, with whatever fields could be recovered.
#[derive(Debug, Clone)]
pub struct SourceRow {
    /// 1-based position in the source: CSV line where the record starts, or array index + 1
    pub line: usize,
    pub row: BatchRow,
    /// Set when the record itself is malformed; such rows are rejected without validation
    pub defect: Option<String>,
}

impl SourceRow {
    pub fn ok(line: usize, row: BatchRow) -> Self {
        SourceRow { line, row, defect: None }
    }

    pub fn malformed(line: usize, row: BatchRow, defect: impl Into<String>) -> Self {
        SourceRow {
            line,
            row,
            defect: Some(defect.into()),
        }
    }
}

pub fn load_rows(csv_path: &Path) -> Result<Vec<SourceRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    load_rows_from_reader(file)
}

/// Read every record; only I/O failures and a header missing a column abort the load.
pub fn load_rows_from_reader<R: Read>(reader: R) -> Result<Vec<SourceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    for column in COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("CSV header is missing the '{}' column", column);
        }
    }

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let fallback_line = rows.len() + 2;
        match rdr.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                rows.push(parse_record(line, &record, &headers));
            }
            Err(e) if e.is_io_error() => {
                return Err(e).context("Failed to read CSV record");
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                rows.push(SourceRow::malformed(line, empty_row(), e.to_string()));
            }
        }
    }

    Ok(rows)
}

fn parse_record(line: usize, record: &csv::StringRecord, headers: &csv::StringRecord) -> SourceRow {
    if record.len() != headers.len() {
        let defect = format!("row has {} fields, expected {}", record.len(), headers.len());
        return SourceRow::malformed(line, recover_fields(record, headers), defect);
    }

    match record.deserialize::<BatchRow>(Some(headers)) {
        Ok(row) => SourceRow::ok(line, row),
        Err(e) => SourceRow::malformed(line, recover_fields(record, headers), e.to_string()),
    }
}

/// Best-effort copy of the named columns present in a malformed record
fn recover_fields(record: &csv::StringRecord, headers: &csv::StringRecord) -> BatchRow {
    let field = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    };

    BatchRow {
        surname: field("surname"),
        given_name: field("given_name"),
        patronymic: field("patronymic"),
        birth_date: field("birth_date"),
        group_id: field("group_id"),
    }
}

fn empty_row() -> BatchRow {
    BatchRow {
        surname: String::new(),
        given_name: String::new(),
        patronymic: String::new(),
        birth_date: String::new(),
        group_id: String::new(),
    }
}

/// Validate and code a single row.
pub fn process_row(line: usize, row: &BatchRow, validator: &InputValidator) -> BatchResult {
    let outcome = parse_birth_date(&row.birth_date).and_then(|birth_date| {
        validator.validate(&RawIdentity {
            surname: row.surname.clone(),
            given_name: row.given_name.clone(),
            patronymic: row.patronymic.clone(),
            birth_date,
            group_id: row.group_id.clone(),
        })
    });

    match outcome {
        Ok(record) => result_for(line, row, generate(&record).to_string(), String::new()),
        Err(e) => {
            warn!(line, kind = e.kind(), "row rejected: {}", e);
            result_for(line, row, String::new(), e.to_string())
        }
    }
}

fn result_for(line: usize, row: &BatchRow, code: String, error: String) -> BatchResult {
    BatchResult {
        line,
        surname: row.surname.clone(),
        given_name: row.given_name.clone(),
        patronymic: row.patronymic.clone(),
        birth_date: row.birth_date.clone(),
        group_id: row.group_id.clone(),
        code,
        error,
    }
}

pub fn process_rows(rows: &[SourceRow], validator: &InputValidator) -> Vec<BatchResult> {
    let results: Vec<BatchResult> = rows
        .iter()
        .map(|source| match &source.defect {
            Some(defect) => {
                warn!(line = source.line, "malformed row: {}", defect);
                result_for(source.line, &source.row, String::new(), format!("malformed row: {}", defect))
            }
            None => process_row(source.line, &source.row, validator),
        })
        .collect();

    info!("{}", BatchSummary::from_results(&results).summary());
    results
}

pub fn write_results<W: Write>(writer: W, results: &[BatchResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(result).context("Failed to write result row")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const INPUT: &str = "\
surname,given_name,patronymic,birth_date,group_id
Ivanov,Ivan,Ivanovich,2000-05-15,101
Petrov,Petr,Petrovich,1999-12-31,202
Sidorov,Sid0r,Sidorovich,2001-01-01,303
Orlova,Olga,Olegovna,15/05/2000,404
Ivanov,Ivan,Ivanovich,2000-05-15,1o1
";

    fn validator() -> InputValidator {
        InputValidator::with_today(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
    }

    #[test]
    fn test_load_rows() {
        let rows = load_rows_from_reader(INPUT.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].row.surname, "Ivanov");
        assert_eq!(rows[3].row.birth_date, "15/05/2000");
        assert!(rows.iter().all(|r| r.defect.is_none()));
    }

    #[test]
    fn test_process_rows_mixed() {
        let rows = load_rows_from_reader(INPUT.as_bytes()).unwrap();
        let results = process_rows(&rows, &validator());

        assert_eq!(results[0].line, 2);
        assert_eq!(results[0].code, "L324Y300");
        assert!(results[0].error.is_empty());

        assert_eq!(results[1].code, "C52QI300");

        assert!(results[2].code.is_empty());
        assert_eq!(results[2].error, "given name must consist of letters only");

        assert!(results[3].code.is_empty());
        assert!(results[3].error.contains("15/05/2000"));

        assert_eq!(results[4].line, 6);
        assert!(results[4].error.contains("group number"));

        let summary = BatchSummary::from_results(&results);
        assert_eq!(
            summary,
            BatchSummary {
                total: 5,
                generated: 2,
                rejected: 3
            }
        );
        assert_eq!(summary.summary(), "5 rows: 2 codes generated, 3 rejected");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let input = "surname,given_name\nIvanov,Ivan\n";
        let err = load_rows_from_reader(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("patronymic"));
    }

    #[test]
    fn test_short_row_does_not_stop_the_run() {
        let input = "\
surname,given_name,patronymic,birth_date,group_id
Ivanov,Ivan,Ivanovich,2000-05-15,101
Sidorov,Sidor,Sidorovich,2001-01-01
Petrov,Petr,Petrovich,1999-12-31,202
";
        let rows = load_rows_from_reader(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].row.surname, "Sidorov");
        assert!(rows[1].defect.is_some());

        let results = process_rows(&rows, &validator());
        assert_eq!(results[0].code, "L324Y300");
        assert_eq!(results[1].line, 3);
        assert!(results[1].code.is_empty());
        assert_eq!(results[1].error, "malformed row: row has 4 fields, expected 5");
        assert_eq!(results[2].line, 4);
        assert_eq!(results[2].code, "C52QI300");
    }

    #[test]
    fn test_line_numbers_follow_multiline_fields() {
        let input = "\
surname,given_name,patronymic,birth_date,group_id
\"Ivanov
Ivanov\",Ivan,Ivanovich,2000-05-15,101
Petrov,Petr,Petrovich,1999-12-31,202
";
        let rows = load_rows_from_reader(input.as_bytes()).unwrap();
        let results = process_rows(&rows, &validator());

        assert_eq!(results[0].line, 2);
        assert!(results[0].error.contains("spaces"));
        assert_eq!(results[1].line, 4);
        assert_eq!(results[1].code, "C52QI300");
    }

    #[test]
    fn test_write_results() {
        let rows = load_rows_from_reader(INPUT.as_bytes()).unwrap();
        let results = process_rows(&rows[..1], &validator());

        let mut out = Vec::new();
        write_results(&mut out, &results).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("line,surname,given_name,patronymic,birth_date,group_id,code,error")
        );
        assert_eq!(
            lines.next(),
            Some("2,Ivanov,Ivan,Ivanovich,2000-05-15,101,L324Y300,")
        );
        assert_eq!(lines.next(), None);
    }
}
