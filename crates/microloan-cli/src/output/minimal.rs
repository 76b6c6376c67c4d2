use serde_json::Value;

use super::scalar;

/// Fields that answer each command, most specific first.
const ANSWER_KEYS: [&str; 6] = [
    "total_due",
    "agrees",
    "valid",
    "final_due_date",
    "outstanding_balance",
    "max_difference",
];

/// Print the single value that answers the command.
pub fn print_minimal(value: &Value) {
    println!("{}", answer(value));
}

fn answer(value: &Value) -> String {
    let Some(envelope) = value.as_object() else {
        return scalar(value, "null");
    };

    // Quotes show the formatted amount when there is one
    if let Some(total) = envelope.get("display").and_then(|d| d.get("total_due")) {
        return scalar(total, "null");
    }

    let section = envelope.get("result").unwrap_or(value);
    for key in ANSWER_KEYS {
        if let Some(val) = section.get(key).or_else(|| envelope.get(key)) {
            if !val.is_null() {
                return scalar(val, "null");
            }
        }
    }

    match section.as_object().and_then(|m| m.iter().next()) {
        Some((key, val)) => format!("{}: {}", key, scalar(val, "null")),
        None => scalar(section, "null"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_prefers_display_total() {
        let v = json!({
            "result": {"total_due": "5032.876712328767123287671233"},
            "display": {"total_due": "KSh 5,033"}
        });
        assert_eq!(answer(&v), "KSh 5,033");
    }

    #[test]
    fn test_reconcile_answer() {
        let v = json!({"result": {"max_difference": "0", "agrees": true}, "results": []});
        assert_eq!(answer(&v), "yes");
    }

    #[test]
    fn test_top_level_keys() {
        let v = json!({"valid": true, "principal": "5000"});
        assert_eq!(answer(&v), "yes");
        let v = json!({"disbursed_on": "2026-01-01", "final_due_date": "2026-01-31"});
        assert_eq!(answer(&v), "2026-01-31");
    }
}
