//! In-memory field registry.
//!
//! Holds the flattened field list for the currently loaded form and
//! validates imported values against each field's type and constraints.
//! Suitable for single-process deployments and tests; a persistent
//! registry would implement the same port against real storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::form::{Field, FieldDefinition, FieldType, FormDefinition};
use crate::domain::foundation::FieldId;
use crate::ports::{FieldRegistry, RegistryError, RegistryStats};

/// Numeric bounds carried from the form definition, keyed by field name.
type Bounds = BTreeMap<String, (Option<f64>, Option<f64>)>;

#[derive(Debug)]
struct LoadedForm {
    fields: Vec<Field>,
    bounds: Bounds,
    thank_you_message: String,
}

/// Field registry backed by process memory.
#[derive(Debug, Clone)]
pub struct InMemoryFieldRegistry {
    form: Arc<RwLock<Option<LoadedForm>>>,
}

impl InMemoryFieldRegistry {
    pub fn new() -> Self {
        Self {
            form: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for InMemoryFieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FieldRegistry for InMemoryFieldRegistry {
    async fn load(&self, definition: FormDefinition) -> Result<(), RegistryError> {
        let fields = definition.flatten();
        let mut bounds = Bounds::new();
        collect_bounds(&definition.items, &mut bounds);
        let thank_you_message = definition.thank_you_or_default().to_string();

        tracing::debug!(fields = fields.len(), "form definition loaded");

        let mut guard = self.form.write().await;
        *guard = Some(LoadedForm {
            fields,
            bounds,
            thank_you_message,
        });
        Ok(())
    }

    async fn fillable_fields(&self) -> Result<Vec<Field>, RegistryError> {
        let guard = self.form.read().await;
        let form = guard.as_ref().ok_or(RegistryError::NotLoaded)?;
        Ok(form
            .fields
            .iter()
            .filter(|field| field.is_fillable())
            .cloned()
            .collect())
    }

    async fn field(&self, id: &FieldId) -> Result<Option<Field>, RegistryError> {
        let guard = self.form.read().await;
        let form = guard.as_ref().ok_or(RegistryError::NotLoaded)?;
        Ok(form.fields.iter().find(|field| field.id == *id).cloned())
    }

    async fn invalid_fields(&self) -> Result<Vec<Field>, RegistryError> {
        let guard = self.form.read().await;
        let form = guard.as_ref().ok_or(RegistryError::NotLoaded)?;
        Ok(form
            .fields
            .iter()
            .filter(|field| field.is_invalid())
            .cloned()
            .collect())
    }

    async fn import_data(&self, data: &BTreeMap<String, Value>) -> Result<(), RegistryError> {
        let mut guard = self.form.write().await;
        let form = guard.as_mut().ok_or(RegistryError::NotLoaded)?;

        for (name, value) in data {
            let bounds = form.bounds.get(name).copied();
            match form.fields.iter_mut().find(|field| field.name == *name) {
                Some(field) => apply_value(field, bounds, value.clone()),
                None => tracing::debug!(field = %name, "ignoring value for unknown field"),
            }
        }
        Ok(())
    }

    async fn thank_you_message(&self) -> Result<String, RegistryError> {
        let guard = self.form.read().await;
        let form = guard.as_ref().ok_or(RegistryError::NotLoaded)?;
        Ok(form.thank_you_message.clone())
    }

    async fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let guard = self.form.read().await;
        let form = guard.as_ref().ok_or(RegistryError::NotLoaded)?;

        let mut by_type = BTreeMap::new();
        for field in &form.fields {
            *by_type
                .entry(field.field_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(RegistryStats {
            total: form.fields.len(),
            required: form.fields.iter().filter(|field| field.required).count(),
            optional: form.fields.iter().filter(|field| !field.required).count(),
            by_type,
        })
    }
}

fn collect_bounds(items: &[FieldDefinition], bounds: &mut Bounds) {
    for item in items {
        if item.min.is_some() || item.max.is_some() {
            bounds.insert(item.name.clone(), (item.min, item.max));
        }
        collect_bounds(&item.items, bounds);
    }
}

/// Stores `value` on `field` and refreshes its validity.
///
/// An empty string clears the field back to its unfilled state. Any
/// other value is kept even when it fails validation, so that the
/// conversation can read the rejected value back to the user.
fn apply_value(field: &mut Field, bounds: Option<(Option<f64>, Option<f64>)>, value: Value) {
    if matches!(&value, Value::String(s) if s.is_empty()) {
        field.value = None;
        field.valid = true;
        field.validation_message = None;
        return;
    }

    let value = normalize(field.field_type, value);
    let verdict = check(field, bounds, &value);
    field.value = Some(value);
    match verdict {
        None => {
            field.valid = true;
            field.validation_message = None;
        }
        Some(message) => {
            tracing::debug!(field = %field.name, %message, "imported value failed validation");
            field.valid = false;
            field.validation_message = Some(message);
        }
    }
}

/// Checkbox groups take arrays; a bare scalar answer is wrapped.
fn normalize(field_type: FieldType, value: Value) -> Value {
    if field_type == FieldType::CheckboxGroup && !value.is_array() {
        Value::Array(vec![value])
    } else {
        value
    }
}

fn check(
    field: &Field,
    bounds: Option<(Option<f64>, Option<f64>)>,
    value: &Value,
) -> Option<String> {
    match field.field_type {
        FieldType::NumberInput | FieldType::Range => check_number(value, bounds),
        FieldType::Checkbox => check_boolean(value),
        FieldType::DateInput => check_date(value),
        FieldType::DatetimeInput => check_datetime(value),
        FieldType::Email => check_email(value),
        FieldType::Url => check_url(value),
        FieldType::Tel => check_phone(value),
        FieldType::DropDown | FieldType::RadioGroup => check_choice(value, &field.enum_options),
        FieldType::CheckboxGroup => check_multi_choice(value, &field.enum_options),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_number(value: &Value, bounds: Option<(Option<f64>, Option<f64>)>) -> Option<String> {
    let number = match numeric(value) {
        Some(number) => number,
        None => return Some("Please enter a valid number".to_string()),
    };
    if let Some((min, max)) = bounds {
        if let Some(min) = min {
            if number < min {
                return Some(format!("Value must be at least {}", min));
            }
        }
        if let Some(max) = max {
            if number > max {
                return Some(format!("Value must be at most {}", max));
            }
        }
    }
    None
}

fn check_boolean(value: &Value) -> Option<String> {
    let ok = match value {
        Value::Bool(_) => true,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "false"),
        _ => false,
    };
    if ok {
        None
    } else {
        Some("This field needs a yes or no answer".to_string())
    }
}

fn check_date(value: &Value) -> Option<String> {
    let ok = value
        .as_str()
        .map_or(false, |s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok());
    if ok {
        None
    } else {
        Some("Please use the YYYY-MM-DD date format".to_string())
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn check_datetime(value: &Value) -> Option<String> {
    let ok = value.as_str().map_or(false, |s| {
        let s = s.trim();
        DateTime::parse_from_rfc3339(s).is_ok()
            || DATETIME_FORMATS
                .iter()
                .any(|format| NaiveDateTime::parse_from_str(s, format).is_ok())
    });
    if ok {
        None
    } else {
        Some("Please provide a valid date and time".to_string())
    }
}

fn check_email(value: &Value) -> Option<String> {
    let ok = value.as_str().map_or(false, |s| {
        let s = s.trim();
        match s.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        }
    });
    if ok {
        None
    } else {
        Some("Please enter a valid email address".to_string())
    }
}

fn check_url(value: &Value) -> Option<String> {
    let ok = value.as_str().map_or(false, |s| {
        let s = s.trim();
        s.strip_prefix("http://")
            .or_else(|| s.strip_prefix("https://"))
            .map_or(false, |rest| !rest.is_empty())
    });
    if ok {
        None
    } else {
        Some("Please enter a valid URL".to_string())
    }
}

fn check_phone(value: &Value) -> Option<String> {
    let ok = value.as_str().map_or(false, |s| {
        let s = s.trim();
        let digits = s.chars().filter(char::is_ascii_digit).count();
        let allowed = s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')' | '.'));
        allowed && (7..=15).contains(&digits)
    });
    if ok {
        None
    } else {
        Some("Please enter a valid phone number".to_string())
    }
}

fn check_choice(value: &Value, options: &[Value]) -> Option<String> {
    if options.is_empty() || option_matches(options, value) {
        None
    } else {
        Some("Please choose one of the available options".to_string())
    }
}

fn check_multi_choice(value: &Value, options: &[Value]) -> Option<String> {
    let items = match value.as_array() {
        Some(items) => items,
        None => return Some("Please choose from the available options".to_string()),
    };
    if options.is_empty() || items.iter().all(|item| option_matches(options, item)) {
        None
    } else {
        Some("Please choose from the available options".to_string())
    }
}

/// Option matching is exact on JSON values, case-insensitive on strings.
fn option_matches(options: &[Value], value: &Value) -> bool {
    options.iter().any(|option| {
        option == value
            || match (option.as_str(), value.as_str()) {
                (Some(o), Some(v)) => o.eq_ignore_ascii_case(v.trim()),
                _ => false,
            }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn registry_with(definition: Value) -> InMemoryFieldRegistry {
        let registry = InMemoryFieldRegistry::new();
        let definition = FormDefinition::from_value(definition).unwrap();
        registry.load(definition).await.unwrap();
        registry
    }

    fn sample_definition() -> Value {
        json!({
            "title": "Contact",
            "items": [
                {"type": "text-input", "name": "full_name", "label": "Full name", "required": true},
                {"type": "email", "name": "email", "label": "Email"},
                {"type": "number-input", "name": "guests", "label": "Guests", "min": 1, "max": 10},
                {"type": "drop-down", "name": "meal", "label": "Meal", "enum": ["Vegetarian", "Vegan", "Fish"]},
                {"type": "checkbox-group", "name": "topics", "label": "Topics", "enum": ["sales", "support"]},
                {"type": "date-input", "name": "arrival", "label": "Arrival"},
                {"type": "checkbox", "name": "newsletter", "label": "Newsletter"}
            ]
        })
    }

    async fn import_one(registry: &InMemoryFieldRegistry, name: &str, value: Value) {
        let mut data = BTreeMap::new();
        data.insert(name.to_string(), value);
        registry.import_data(&data).await.unwrap();
    }

    async fn field_by_name(registry: &InMemoryFieldRegistry, name: &str) -> Field {
        let guard = registry.form.read().await;
        guard
            .as_ref()
            .unwrap()
            .fields
            .iter()
            .find(|field| field.name == name)
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_queries_before_load_fail() {
        let registry = InMemoryFieldRegistry::new();
        assert!(matches!(
            registry.fillable_fields().await,
            Err(RegistryError::NotLoaded)
        ));
        assert!(matches!(
            registry.import_data(&BTreeMap::new()).await,
            Err(RegistryError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_load_exposes_fillable_fields_in_document_order() {
        let registry = InMemoryFieldRegistry::new();
        let definition = FormDefinition::from_value(sample_definition()).unwrap();
        registry.load(definition).await.unwrap();

        let names: Vec<String> = registry
            .fillable_fields()
            .await
            .unwrap()
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(
            names,
            vec!["full_name", "email", "guests", "meal", "topics", "arrival", "newsletter"]
        );
    }

    #[tokio::test]
    async fn test_import_fills_fields_and_shrinks_the_fillable_set() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "full_name", json!("Ada Lovelace")).await;

        let field = field_by_name(&registry, "full_name").await;
        assert_eq!(field.value, Some(json!("Ada Lovelace")));
        assert!(field.valid);

        let fillable = registry.fillable_fields().await.unwrap();
        assert!(fillable.iter().all(|field| field.name != "full_name"));
    }

    #[tokio::test]
    async fn test_unknown_names_are_ignored() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "no_such_field", json!("whatever")).await;
        assert!(registry.invalid_fields().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_number_bounds_are_enforced() {
        let registry = registry_with(sample_definition()).await;

        import_one(&registry, "guests", json!(30)).await;
        let field = field_by_name(&registry, "guests").await;
        assert!(!field.valid);
        assert_eq!(
            field.validation_message.as_deref(),
            Some("Value must be at most 10")
        );

        import_one(&registry, "guests", json!("4")).await;
        let field = field_by_name(&registry, "guests").await;
        assert!(field.valid, "numeric strings within bounds pass");
    }

    #[tokio::test]
    async fn test_non_numeric_value_is_rejected_for_number_input() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "guests", json!("a few")).await;

        let invalid = registry.invalid_fields().await.unwrap();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].name, "guests");
        assert_eq!(
            invalid[0].validation_message.as_deref(),
            Some("Please enter a valid number")
        );
    }

    #[tokio::test]
    async fn test_invalid_field_stays_fillable_until_corrected() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "arrival", json!("next tuesday")).await;

        let fillable = registry.fillable_fields().await.unwrap();
        assert!(fillable.iter().any(|field| field.name == "arrival"));

        import_one(&registry, "arrival", json!("2026-09-01")).await;
        assert!(registry.invalid_fields().await.unwrap().is_empty());
        let fillable = registry.fillable_fields().await.unwrap();
        assert!(fillable.iter().all(|field| field.name != "arrival"));
    }

    #[tokio::test]
    async fn test_email_shape_is_validated() {
        let registry = registry_with(sample_definition()).await;

        import_one(&registry, "email", json!("not-an-email")).await;
        let field = field_by_name(&registry, "email").await;
        assert!(!field.valid);

        import_one(&registry, "email", json!("ada@example.org")).await;
        let field = field_by_name(&registry, "email").await;
        assert!(field.valid);
    }

    #[tokio::test]
    async fn test_drop_down_values_must_match_an_option() {
        let registry = registry_with(sample_definition()).await;

        import_one(&registry, "meal", json!("Steak")).await;
        let field = field_by_name(&registry, "meal").await;
        assert!(!field.valid);

        import_one(&registry, "meal", json!("vegan")).await;
        let field = field_by_name(&registry, "meal").await;
        assert!(field.valid, "option matching is case-insensitive");
    }

    #[tokio::test]
    async fn test_checkbox_group_wraps_a_scalar_answer() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "topics", json!("sales")).await;

        let field = field_by_name(&registry, "topics").await;
        assert_eq!(field.value, Some(json!(["sales"])));
        assert!(field.valid);
    }

    #[tokio::test]
    async fn test_checkbox_group_rejects_unknown_members() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "topics", json!(["sales", "gossip"])).await;

        let field = field_by_name(&registry, "topics").await;
        assert!(!field.valid);
    }

    #[tokio::test]
    async fn test_checkbox_takes_booleans_and_boolean_strings() {
        let registry = registry_with(sample_definition()).await;

        import_one(&registry, "newsletter", json!(false)).await;
        let field = field_by_name(&registry, "newsletter").await;
        assert!(field.valid);
        assert_eq!(field.value, Some(json!(false)));

        import_one(&registry, "newsletter", json!("maybe")).await;
        let field = field_by_name(&registry, "newsletter").await;
        assert!(!field.valid);
    }

    #[tokio::test]
    async fn test_empty_string_clears_a_field() {
        let registry = registry_with(sample_definition()).await;
        import_one(&registry, "guests", json!("not a number")).await;
        import_one(&registry, "guests", json!("")).await;

        let field = field_by_name(&registry, "guests").await;
        assert!(field.value.is_none());
        assert!(field.valid);
        assert!(field.validation_message.is_none());
    }

    #[tokio::test]
    async fn test_thank_you_message_falls_back_to_the_default() {
        let registry = registry_with(sample_definition()).await;
        assert_eq!(
            registry.thank_you_message().await.unwrap(),
            "Thank you for your submission!"
        );

        let registry = registry_with(json!({
            "thankYouMessage": "See you there!",
            "items": [{"type": "text-input", "name": "one"}]
        }))
        .await;
        assert_eq!(registry.thank_you_message().await.unwrap(), "See you there!");
    }

    #[tokio::test]
    async fn test_stats_count_fields_by_requirement_and_type() {
        let registry = registry_with(sample_definition()).await;
        let stats = registry.stats().await.unwrap();

        assert_eq!(stats.total, 7);
        assert_eq!(stats.required, 1);
        assert_eq!(stats.optional, 6);
        assert_eq!(stats.by_type.get("email"), Some(&1));
        assert_eq!(stats.by_type.get("text-input"), Some(&1));
    }
}
