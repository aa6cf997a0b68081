//! CSV field parsing and writing.
//!
//! Values in PBS files are comma separated. Each field is converted to a
//! typed [`Value`] according to its schema [`Element`]; the writer performs
//! the inverse so a parsed row can be written back unchanged.

use crate::schema::{Element, FieldType, Row, Value};
use crate::types::Name;

/// Split a CSV line on commas, honouring double quotes.
///
/// Quoted fields keep their inner text verbatim (`""` is an escaped quote);
/// unquoted fields are trimmed.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() && !was_quoted => {
                current.clear();
                in_quotes = true;
                was_quoted = true;
            }
            ',' if !in_quotes => {
                fields.push(finish_field(&current, was_quoted));
                current.clear();
                was_quoted = false;
            }
            _ => current.push(c),
        }
    }
    fields.push(finish_field(&current, was_quoted));
    fields
}

fn finish_field(field: &str, quoted: bool) -> String {
    if quoted {
        field.trim_end().to_string()
    } else {
        field.trim().to_string()
    }
}

/// Quote a value if it would not survive [`split_csv_line`] as is.
pub fn csv_quote(value: &str) -> String {
    let needs_quotes = value.contains(',')
        || value.contains('"')
        || value.starts_with(' ')
        || value.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Remove surrounding quotes from a single string value.
pub fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
    } else {
        trimmed.to_string()
    }
}

fn is_name(raw: &str) -> bool {
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => false,
        Some(c) if c.is_alphanumeric() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.to_ascii_uppercase().as_str() {
        "1" | "TRUE" | "YES" | "Y" => Some(true),
        "0" | "FALSE" | "NO" | "N" => Some(false),
        _ => None,
    }
}

/// Parse one raw field according to its element description.
///
/// Returns `Ok(None)` for an empty optional field (or `none` where allowed).
/// The error string names the offending value and the expected shape.
pub fn parse_element(raw: &str, element: &Element) -> Result<Option<Value>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return if element.optional {
            Ok(None)
        } else {
            Err("Expected a value but found nothing.".to_string())
        };
    }
    if element.allow_none && raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let value = match &element.ty {
        FieldType::Integer => match parse_integer(raw) {
            Some(n) if i32::try_from(n).is_ok() => Value::Int(n),
            Some(_) => return Err(out_of_range(raw)),
            None => return Err(format!("Field '{raw}' is not an integer.")),
        },
        FieldType::UnsignedInteger => match parse_integer(raw) {
            Some(n) if n >= 0 && !raw.starts_with('-') => in_u32_range(raw, n)?,
            _ => return Err(format!("Field '{raw}' is not a positive integer or 0.")),
        },
        FieldType::PositiveInteger => match parse_integer(raw) {
            Some(n) if n > 0 => in_u32_range(raw, n)?,
            _ => return Err(format!("Field '{raw}' is not a positive integer.")),
        },
        FieldType::Hexadecimal => {
            let digits = raw
                .strip_prefix("0x")
                .or_else(|| raw.strip_prefix("0X"))
                .unwrap_or(raw);
            i64::from_str_radix(digits, 16)
                .map(Value::Int)
                .map_err(|_| format!("Field '{raw}' is not a hexadecimal number."))?
        }
        FieldType::Float => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| format!("Field '{raw}' is not a number."))?,
        FieldType::Boolean => parse_boolean(raw)
            .map(Value::Bool)
            .ok_or_else(|| format!("Field '{raw}' is not a Boolean value (true, false, 1, 0)."))?,
        FieldType::Name => {
            if !is_name(raw) {
                return Err(format!(
                    "Field '{raw}' must contain only letters, digits, and underscores and can't begin with a number."
                ));
            }
            Value::Name(Name::new(raw))
        }
        FieldType::String | FieldType::UnformattedText => Value::Str(raw.to_string()),
        FieldType::Symbol => Value::Name(Name::new(raw)),
        FieldType::Enumerable(table) => table
            .find(raw)
            .map(|v| Value::Name(Name::new(v)))
            .ok_or_else(|| format!("Undefined value {raw} in {}.", table.name))?,
        FieldType::EnumerableOrInteger(table) => match parse_integer(raw) {
            Some(n) => Value::Int(n),
            None => table
                .find(raw)
                .map(|v| Value::Name(Name::new(v)))
                .ok_or_else(|| format!("Undefined value {raw} in {}.", table.name))?,
        },
    };
    Ok(Some(value))
}

fn out_of_range(raw: &str) -> String {
    format!("Field '{raw}' is out of range.")
}

fn in_u32_range(raw: &str, n: i64) -> Result<Value, String> {
    u32::try_from(n).map(|_| Value::Int(n)).map_err(|_| out_of_range(raw))
}

/// Parse a single unsigned or positive field as a `u32`.
pub fn parse_uint(raw: &str, element: &Element) -> Result<u32, String> {
    let value = parse_element(raw, element)?;
    let n = value
        .as_ref()
        .and_then(Value::as_int)
        .ok_or_else(|| "Expected a value but found nothing.".to_string())?;
    u32::try_from(n).map_err(|_| out_of_range(raw.trim()))
}

/// Parse a single signed field as an `i32`.
pub fn parse_i32(raw: &str, element: &Element) -> Result<i32, String> {
    let value = parse_element(raw, element)?;
    let n = value
        .as_ref()
        .and_then(Value::as_int)
        .ok_or_else(|| "Expected a value but found nothing.".to_string())?;
    i32::try_from(n).map_err(|_| out_of_range(raw.trim()))
}

/// Check that an integer lies in `min..=max`.
pub fn check_range(value: i64, min: i64, max: i64, what: &str) -> Result<i64, String> {
    if value < min || value > max {
        Err(format!("Invalid {what}: {value} (must be {min}-{max})."))
    } else {
        Ok(value)
    }
}

/// Write a single value as it appears in a PBS file.
pub fn write_value(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Float(f) => format!("{:.1}", f),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => csv_quote(s),
        Value::Name(n) => n.to_string(),
    }
}

/// Write a row of values, dropping trailing empty optional fields.
pub fn write_row(row: &Row, elements: &[Element]) -> String {
    if elements.len() == 1 && matches!(elements[0].ty, FieldType::UnformattedText) {
        return match row.first() {
            Some(Some(Value::Str(s))) => s.clone(),
            Some(Some(other)) => write_value(other),
            _ => String::new(),
        };
    }

    let mut fields: Vec<String> = row
        .iter()
        .map(|v| v.as_ref().map(write_value).unwrap_or_default())
        .collect();
    while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields.join(",")
}
