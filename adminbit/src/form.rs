use crate::error::AppError;
use crate::record::{FieldValue, Record};
use crate::schema::{FieldDescriptor, FieldType};
use serde_json::Value;

/// Transient state of one editing session: either creating a new record or
/// editing an existing one. Closed by a successful save or an explicit cancel;
/// a failed save keeps the session open for retry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditingSession {
    #[default]
    Closed,
    Creating(FormState),
    Editing { target_id: u64, form: FormState },
}

impl EditingSession {
    pub fn is_open(&self) -> bool {
        !matches!(self, EditingSession::Closed)
    }

    pub fn target_id(&self) -> Option<u64> {
        match self {
            EditingSession::Editing { target_id, .. } => Some(*target_id),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&FormState> {
        match self {
            EditingSession::Closed => None,
            EditingSession::Creating(form) => Some(form),
            EditingSession::Editing { form, .. } => Some(form),
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        match self {
            EditingSession::Closed => None,
            EditingSession::Creating(form) => Some(form),
            EditingSession::Editing { form, .. } => Some(form),
        }
    }
}

/// Editable field values of an open session, ordered by the collection schema.
/// Type coercion happens on every write, not in a separate validating state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    values: Vec<(String, FieldValue)>,
}

impl FormState {
    /// Form for a new record: 0 for number fields, empty string otherwise.
    pub fn for_create(fields: &[FieldDescriptor]) -> Self {
        let values = fields
            .iter()
            .map(|f| {
                let value = if f.field_type.is_numeric() {
                    FieldValue::Number(0.0)
                } else {
                    FieldValue::Text(String::new())
                };
                (f.name.clone(), value)
            })
            .collect();
        Self { values }
    }

    /// Form pre-filled verbatim from an existing record; schema fields the
    /// record does not carry stay absent.
    pub fn for_edit(fields: &[FieldDescriptor], record: &Record) -> Self {
        let values = fields
            .iter()
            .filter_map(|f| record.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Writes one raw input, coerced by the field type: non-numeric input for
    /// a number field becomes 0 rather than being rejected.
    pub fn set_input(&mut self, field: &FieldDescriptor, raw: &str) {
        self.set(&field.name, coerce(field.field_type, raw));
    }

    fn set(&mut self, name: &str, value: FieldValue) {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    /// Applies a JSON payload at the service boundary, keeping only schema
    /// fields and coercing each value by its declared type.
    pub fn apply_json(&mut self, fields: &[FieldDescriptor], payload: &Value) -> Result<(), AppError> {
        let object = payload
            .as_object()
            .ok_or_else(|| AppError::BadRequest("form payload must be a JSON object".to_string()))?;
        for field in fields {
            let Some(value) = object.get(&field.name) else { continue };
            let coerced = match value {
                Value::String(s) => coerce(field.field_type, s),
                Value::Number(n) if field.field_type.is_numeric() => {
                    FieldValue::Number(n.as_f64().unwrap_or(0.0))
                }
                Value::Number(n) => FieldValue::Text(n.to_string()),
                other => {
                    return Err(AppError::BadRequest(format!(
                        "field `{}` expects a scalar, got {other}",
                        field.name
                    )))
                }
            };
            self.set(&field.name, coerced);
        }
        Ok(())
    }

    /// Required-field enforcement: a required field must be present and, for
    /// text-like types, non-empty. This is the only validation the engine does.
    pub fn validate_required(&self, fields: &[FieldDescriptor]) -> Result<(), AppError> {
        for field in fields.iter().filter(|f| f.required) {
            match self.get(&field.name) {
                None => return Err(AppError::BadRequest(format!("field `{}` is required", field.name))),
                Some(FieldValue::Text(s)) if s.is_empty() => {
                    return Err(AppError::BadRequest(format!("field `{}` is required", field.name)))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Materializes the form into a record carrying the given id. The id never
    /// comes from form input.
    pub fn into_record(self, id: u64) -> Record {
        let mut record = Record::new(id);
        for (name, value) in self.values {
            record.set(&name, value);
        }
        record
    }
}

fn coerce(field_type: FieldType, raw: &str) -> FieldValue {
    if field_type.is_numeric() {
        FieldValue::Number(raw.trim().parse::<f64>().unwrap_or(0.0))
    } else {
        FieldValue::Text(raw.to_string())
    }
}
