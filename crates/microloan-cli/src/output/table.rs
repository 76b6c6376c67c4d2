use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar;

/// Render output as tables. A quote shows its formatted `display` block
/// when present; schedules and comparisons show their `results` rows.
pub fn print_table(value: &Value) {
    let Some(envelope) = value.as_object() else {
        match value {
            Value::Array(rows) => println!("{}", rows_table(rows)),
            other => println!("{}", scalar(other, "-")),
        }
        return;
    };

    let headline = envelope
        .get("display")
        .or_else(|| envelope.get("result"))
        .and_then(Value::as_object);
    match headline {
        Some(section) => println!("{}", pairs_table(section)),
        None => {
            let scalars: Map<String, Value> = envelope
                .iter()
                .filter(|(k, v)| k.as_str() != "results" && !v.is_array() && !v.is_object())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !scalars.is_empty() {
                println!("{}", pairs_table(&scalars));
            }
        }
    }

    if let Some(Value::Array(rows)) = envelope.get("results") {
        println!("{}", rows_table(rows));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn pairs_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.replace('_', " "), scalar(val, "-")]);
    }
    builder.build()
}

fn rows_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();
    match rows.first() {
        Some(Value::Object(first)) => {
            let headers: Vec<String> = first.keys().cloned().collect();
            builder.push_record(headers.iter().map(|h| h.replace('_', " ")));
            for row in rows.iter().filter_map(Value::as_object) {
                builder.push_record(
                    headers
                        .iter()
                        .map(|h| row.get(h).map(|v| scalar(v, "-")).unwrap_or_default()),
                );
            }
        }
        _ => {
            for row in rows {
                builder.push_record([scalar(row, "-")]);
            }
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_table_headers() {
        let rows = json!([
            {"field": "total_due", "left_value": "10850", "right_value": "10850"},
        ]);
        let rendered = rows_table(rows.as_array().unwrap()).to_string();
        // Headers lose their underscores; cell values are left alone
        assert!(rendered.contains("left value"));
        assert!(!rendered.contains("left_value"));
        assert!(rendered.contains("total_due"));
        assert!(rendered.contains("10850"));
    }

    #[test]
    fn test_pairs_table() {
        let v = json!({"principal": "KSh 5,000", "fee_deducted": true});
        let rendered = pairs_table(v.as_object().unwrap()).to_string();
        assert!(rendered.contains("KSh 5,000"));
        assert!(rendered.contains("yes"));
    }
}
