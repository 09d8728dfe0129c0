use serde_json::{Map, Value};

use cuesight_core::Table;

use crate::{AnalysisError, AnalysisResult, Point, FALLBACK_TEXT};

/// A field that was present in the model output but unusable. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialField {
    Text,
    StrokePoint,
    Path,
    PathEntry(usize),
}

/// Parse raw model output into a bounds-safe result.
pub fn sanitize(raw: &str, table: Table) -> Result<AnalysisResult, AnalysisError> {
    let (result, issues) = sanitize_with_report(raw, table)?;
    if !issues.is_empty() {
        tracing::warn!(?issues, "dropped unusable fields from model output");
    }
    Ok(result)
}

pub fn sanitize_with_report(
    raw: &str,
    table: Table,
) -> Result<(AnalysisResult, Vec<PartialField>), AnalysisError> {
    let obj = parse_object(raw)?;
    let mut issues = Vec::new();

    let text = match obj.get("text") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        None | Some(Value::Null) => FALLBACK_TEXT.to_string(),
        Some(_) => {
            issues.push(PartialField::Text);
            FALLBACK_TEXT.to_string()
        }
    };

    let stroke_point = match obj.get("strokePoint") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let p = as_point(v, table);
            if p.is_none() {
                issues.push(PartialField::StrokePoint);
            }
            p
        }
    };

    let path = match obj.get("path") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                let p = as_point(v, table);
                if p.is_none() {
                    issues.push(PartialField::PathEntry(i));
                }
                p
            })
            .collect(),
        Some(_) => {
            issues.push(PartialField::Path);
            Vec::new()
        }
    };

    Ok((
        AnalysisResult {
            text,
            stroke_point,
            path,
        },
        issues,
    ))
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, AnalysisError> {
    let stripped = strip_code_fence(raw);
    let value = match serde_json::from_str::<Value>(stripped) {
        Ok(v) => v,
        Err(first) => {
            // Fall back to the outermost braces when the JSON is wrapped in prose
            extract_json_object(raw)
                .and_then(|s| serde_json::from_str::<Value>(s).ok())
                .ok_or_else(|| AnalysisError::MalformedResponse(first.to_string()))?
        }
    };
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(AnalysisError::MalformedResponse(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

/// Remove a surrounding ``` fence (with or without a language tag).
fn strip_code_fence(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = s.trim_end().strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// A two-element numeric array, clamped into the table one axis at a time.
fn as_point(v: &Value, table: Table) -> Option<Point> {
    match v.as_array()?.as_slice() {
        [x, y] => Some([table.clamp_x(x.as_f64()?), table.clamp_y(y.as_f64()?)]),
        _ => None,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
