//! Model prediction channels.
//!
//! Dataset variants store predicted labels and scores either as scalars or as
//! one-element arrays, and scores sometimes as strings. Everything is folded
//! into a fixed `(label, score)` pair here, before display or export sees it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    pub channel: String,
    pub label: Option<String>,
    pub score: Option<f64>,
}

impl Prediction {
    /// Normalize raw row values for one channel.
    pub fn from_values(channel: &str, label: Option<&Value>, score: Option<&Value>) -> Self {
        Self {
            channel: channel.to_string(),
            label: label.and_then(first_scalar).and_then(label_text),
            score: score.and_then(first_scalar).and_then(score_number),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.score.is_none()
    }

    pub fn label_display(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// Score with three decimals, or empty when absent.
    pub fn score_display(&self) -> String {
        self.score.map(|s| format!("{:.3}", s)).unwrap_or_default()
    }
}

/// Unwrap arrays to their first non-null element.
fn first_scalar(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => items.iter().find(|v| !v.is_null()).and_then(first_scalar),
        other => Some(other),
    }
}

fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn score_number(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    score.is_finite().then_some(score)
}
