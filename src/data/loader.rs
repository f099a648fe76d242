use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

/// Column read from tabular inputs when more than one column is present.
pub const VALUE_COLUMN: &str = "value";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a one-dimensional scalar array from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – a numeric `value` column (or the only numeric column)
/// * `.json`    – `[0.1, 0.2, ...]` or `{ "values": [...] }`
/// * `.csv`     – a `value` column, or one unnamed column of numbers
/// * `.txt`     – whitespace-separated numbers
pub fn load_scalars(path: &Path) -> Result<Vec<f64>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let values = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        "txt" | "dat" => load_text(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::debug!("Loaded {} scalars from {}", values.len(), path.display());
    Ok(values)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let array = match &root {
        JsonValue::Array(_) => &root,
        JsonValue::Object(obj) => obj
            .get("values")
            .context("Expected a top-level array or a \"values\" key")?,
        _ => bail!("Expected a top-level array or a \"values\" key"),
    };
    json_array_to_f64(array)
}

fn json_array_to_f64(val: &JsonValue) -> Result<Vec<f64>> {
    let arr = val.as_array().context("'values' is not an array")?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| match v {
            // NaN has no JSON literal; null stands in for it.
            JsonValue::Null => Ok(f64::NAN),
            v => v.as_f64().with_context(|| format!("values[{j}]: not a number")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: either a header row containing a `value` column, or a
/// single column of bare numbers without a header.
fn load_csv(path: &Path) -> Result<Vec<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let mut records = reader.records();
    let Some(first) = records.next() else {
        return Ok(Vec::new());
    };
    let first = first.context("CSV row 0")?;

    let mut values = Vec::new();
    let col = match first.get(0).map(parse_number) {
        Some(Ok(v)) => {
            values.push(v);
            0
        }
        // First row is a header.
        _ => first
            .iter()
            .position(|h| h == VALUE_COLUMN)
            .or_else(|| (first.len() == 1).then_some(0))
            .with_context(|| format!("CSV missing '{VALUE_COLUMN}' column"))?,
    };

    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        let cell = record.get(col).unwrap_or("");
        let v = parse_number(cell)
            .with_context(|| format!("CSV row {}: '{cell}' is not a number", row_no + 1))?;
        values.push(v);
    }
    Ok(values)
}

fn parse_number(s: &str) -> Result<f64> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    Ok(s.parse::<f64>()?)
}

// ---------------------------------------------------------------------------
// Plain text loader
// ---------------------------------------------------------------------------

fn load_text(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path).context("reading text file")?;
    text.split_whitespace()
        .enumerate()
        .map(|(i, tok)| {
            parse_number(tok).with_context(|| format!("token {i}: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one value per row.
///
/// The `value` column is used when present, otherwise the file must have
/// exactly one numeric column. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut values = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let idx = match schema.index_of(VALUE_COLUMN) {
            Ok(i) => i,
            Err(_) => {
                let numeric: Vec<usize> = schema
                    .fields()
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| is_numeric(f.data_type()))
                    .map(|(i, _)| i)
                    .collect();
                match numeric.as_slice() {
                    [only] => *only,
                    [] => bail!("Parquet file has no numeric column"),
                    _ => bail!(
                        "Parquet file has several numeric columns; name one '{VALUE_COLUMN}'"
                    ),
                }
            }
        };

        extend_f64(batch.column(idx).as_ref(), &mut values)
            .with_context(|| format!("reading column '{}'", schema.field(idx).name()))?;
    }

    Ok(values)
}

// -- Parquet / Arrow helpers --

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Append a numeric Arrow column to `out`, nulls becoming NaN.
fn extend_f64(col: &dyn Array, out: &mut Vec<f64>) -> Result<()> {
    let any = col.as_any();
    if let Some(arr) = any.downcast_ref::<Float64Array>() {
        out.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
    } else if let Some(arr) = any.downcast_ref::<Int64Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)));
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
    } else {
        bail!("Expected a numeric column, got {:?}", col.data_type());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn json_array_and_object() {
        let (_d, p) = write_temp("a.json", "[0.0, 0.5, null, 1]");
        let v = load_scalars(&p).unwrap();
        assert_eq!(v.len(), 4);
        assert!(v[2].is_nan());

        let (_d, p) = write_temp("b.json", r#"{"values": [3, 4]}"#);
        assert_eq!(load_scalars(&p).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn csv_with_and_without_header() {
        let (_d, p) = write_temp("a.csv", "1.5\n2.5\n");
        assert_eq!(load_scalars(&p).unwrap(), vec![1.5, 2.5]);

        let (_d, p) = write_temp("b.csv", "region,value\nV1, 0.25\nV2,0.75\n");
        assert_eq!(load_scalars(&p).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn csv_without_value_column_fails() {
        let (_d, p) = write_temp("c.csv", "a,b\n1,2\n");
        assert!(load_scalars(&p).is_err());
    }

    #[test]
    fn text_is_whitespace_separated() {
        let (_d, p) = write_temp("a.txt", "1 2\n3\tnan\n");
        let v = load_scalars(&p).unwrap();
        assert_eq!(&v[..3], &[1.0, 2.0, 3.0]);
        assert!(v[3].is_nan());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let (_d, p) = write_temp("a.xlsx", "");
        assert!(load_scalars(&p).is_err());
    }
}
