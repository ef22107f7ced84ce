use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Default hourly parameter subset kept when trimming a raw artifact.
pub const DEFAULT_HOURLY_PARAMETERS: &[&str] = &[
    "DATE", "PSTAT", "T", "UABS", "U", "TD", "GLO", "DIR", "DIF", "N", "INFRAR", "DD", "FF", "RR1",
];

/// In-memory tabular view over one or more downloaded artifacts.
///
/// Artifacts arrive as `;`-delimited text; all fields are kept as strings
/// (the raw files use decimal commas, which stay untouched).
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Reads the given artifact files and concatenates their rows. Every
    /// file must share the same header.
    pub fn from_artifacts<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::Dataset("no artifact files provided".to_string()));
        }

        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(b';')
                .flexible(true)
                .from_path(path)
                .map_err(|e| Error::Dataset(format!("failed to read {}: {e}", path.display())))?;

            let headers: Vec<String> = reader
                .headers()
                .map_err(|e| Error::Dataset(format!("bad header in {}: {e}", path.display())))?
                .iter()
                .map(str::to_string)
                .collect();

            match &columns {
                None => columns = Some(headers),
                Some(expected) if *expected == headers => {}
                Some(_) => {
                    return Err(Error::Dataset(format!(
                        "{} does not share the header of the first artifact",
                        path.display()
                    )));
                }
            }

            for record in reader.records() {
                let record = record
                    .map_err(|e| Error::Dataset(format!("bad row in {}: {e}", path.display())))?;
                rows.push(record.iter().map(str::to_string).collect());
            }
        }

        Ok(Self {
            columns: columns.unwrap_or_default(),
            rows,
        })
    }

    /// All parameters (columns) present in the dataset.
    pub fn parameters(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Projection onto the named columns, in the given order.
    pub fn subset(&self, columns: &[&str]) -> Result<Dataset> {
        let indices: Vec<usize> = columns
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| Error::Dataset(format!("column {name} is not in the dataset")))
            })
            .collect::<Result<_>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// [`subset`](Self::subset) with the default hourly parameter list.
    pub fn hourly_subset(&self) -> Result<Dataset> {
        self.subset(DEFAULT_HOURLY_PARAMETERS)
    }

    /// Share of missing (empty) values per column, in percent.
    pub fn missing_percentages(&self) -> Vec<(String, f64)> {
        let total = self.rows.len();
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let missing = self
                    .rows
                    .iter()
                    .filter(|row| row.get(i).is_none_or(|v| v.trim().is_empty()))
                    .count();
                let pct = if total == 0 {
                    0.0
                } else {
                    missing as f64 * 100.0 / total as f64
                };
                (name.clone(), pct)
            })
            .collect()
    }

    /// Writes the dataset as `,`-delimited CSV, preceded by one
    /// `#<field padded to 10> : <value>` banner line per metadata pair.
    pub fn save_annotated(&self, path: &Path, metadata: &[(&str, String)]) -> Result<()> {
        let mut file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        for (field, value) in metadata {
            writeln!(file, "#{field:<10} : {value}").map_err(|e| Error::io(path, e))?;
        }

        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(&self.columns)
            .map_err(|e| Error::Dataset(format!("failed to write {}: {e}", path.display())))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| Error::Dataset(format!("failed to write {}: {e}", path.display())))?;
        }
        writer
            .flush()
            .map_err(|e| Error::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn concatenates_artifacts_with_matching_headers() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(dir.path(), "a.csv", "DATE;T;RR1\n2020010100;1,5;0\n");
        let b = artifact(dir.path(), "b.csv", "DATE;T;RR1\n2021010100;2,0;\n");
        let ds = Dataset::from_artifacts(&[a, b]).unwrap();
        assert_eq!(ds.parameters(), ["DATE", "T", "RR1"]);
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn header_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(dir.path(), "a.csv", "DATE;T\n2020010100;1,5\n");
        let b = artifact(dir.path(), "b.csv", "DATE;FF\n2020010100;3,2\n");
        assert!(matches!(
            Dataset::from_artifacts(&[a, b]),
            Err(Error::Dataset(_))
        ));
    }

    #[test]
    fn subset_projects_and_rejects_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(dir.path(), "a.csv", "DATE;T;RR1\n2020010100;1,5;0\n");
        let ds = Dataset::from_artifacts(&[a]).unwrap();
        let sub = ds.subset(&["DATE", "RR1"]).unwrap();
        assert_eq!(sub.parameters(), ["DATE", "RR1"]);
        assert!(ds.subset(&["NOPE"]).is_err());
    }

    #[test]
    fn missing_percentages_count_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(
            dir.path(),
            "a.csv",
            "DATE;T\n2020010100;\n2020010101;1,0\n2020010102;\n2020010103;2,0\n",
        );
        let ds = Dataset::from_artifacts(&[a]).unwrap();
        let missing = ds.missing_percentages();
        assert_eq!(missing[0], ("DATE".to_string(), 0.0));
        assert_eq!(missing[1], ("T".to_string(), 50.0));
    }

    #[test]
    fn annotated_output_carries_the_banner() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(dir.path(), "a.csv", "DATE;T\n2020010100;1,5\n");
        let ds = Dataset::from_artifacts(&[a]).unwrap();

        let out = dir.path().join("out.csv");
        ds.save_annotated(&out, &[("ID", "59343001".to_string()), ("Nom", "LILLE".to_string())])
            .unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("#ID         : 59343001"));
        assert_eq!(lines.next(), Some("#Nom        : LILLE"));
        assert_eq!(lines.next(), Some("DATE,T"));
        assert_eq!(lines.next(), Some("2020010100,\"1,5\""));
    }
}
