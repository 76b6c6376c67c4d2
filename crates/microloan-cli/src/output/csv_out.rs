use serde_json::{Map, Value};
use std::io;

use super::scalar;

/// Write output as CSV to stdout. Installment and comparison rows become
/// one record each; anything else is written as field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_csv(&mut wtr, value) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => match (map.get("results"), map.get("result")) {
            (Some(Value::Array(rows)), _) => write_rows(wtr, rows)?,
            (_, Some(Value::Object(result))) => write_pairs(wtr, result)?,
            _ => write_pairs(wtr, map)?,
        },
        Value::Array(rows) => write_rows(wtr, rows)?,
        other => wtr.write_record([scalar(other, "")])?,
    }
    wtr.flush()?;
    Ok(())
}

fn write_pairs<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &scalar(val, "")])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            wtr.write_record([scalar(row, "")])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for row in rows.iter().filter_map(Value::as_object) {
        wtr.write_record(
            headers
                .iter()
                .map(|h| row.get(*h).map(|v| scalar(v, "")).unwrap_or_default()),
        )?;
    }
    Ok(())
}
