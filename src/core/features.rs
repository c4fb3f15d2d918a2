use serde_json::{Map, Value};
use thiserror::Error;

/// Number of features the model consumes
pub const N_FEATURES: usize = 13;

/// Feature names in the order the model was trained on
///
/// Vector assembly always follows this order, never the order in which the
/// fields arrive in the request body.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "CRIM", "ZN", "INDUS", "CHAS", "NOX", "RM", "AGE", "DIS", "RAD", "TAX", "PTRATIO", "B",
    "LSTAT",
];

/// Errors raised while turning a request body into a feature vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No {0} provided")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value} could not be converted to float")]
    TypeConversion { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the feature that failed validation
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::TypeConversion { field, .. } => field,
        }
    }

    /// Short machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::TypeConversion { .. } => "invalid_field",
        }
    }
}

/// Convert a single JSON value into a finite float
///
/// Numbers are taken as-is and strings are parsed after trimming. Everything
/// else (booleans, null, arrays, objects) is rejected.
pub fn parse_feature(field: &'static str, value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::TypeConversion {
            field,
            value: value.to_string(),
        }),
    }
}

/// One prediction input, ordered by [`FEATURE_NAMES`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    /// Validate a request body and assemble it in schema order
    ///
    /// Fields are checked sequentially and the first failure is returned.
    /// Keys that are not part of the schema are ignored.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut values = [0.0; N_FEATURES];

        for (slot, &name) in values.iter_mut().zip(FEATURE_NAMES.iter()) {
            let value = body.get(name).ok_or(ValidationError::MissingField(name))?;
            *slot = parse_feature(name, value)?;
        }

        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Map<String, Value> {
        let body = json!({
            "CRIM": 0.1, "ZN": 0, "INDUS": 7, "CHAS": 0, "NOX": 0.5, "RM": 6,
            "AGE": 65, "DIS": 4, "RAD": 1, "TAX": 300, "PTRATIO": 15, "B": 390,
            "LSTAT": 5
        });
        body.as_object().cloned().unwrap()
    }

    #[test]
    fn test_assembles_in_schema_order() {
        let vector = FeatureVector::from_json(&valid_body()).unwrap();
        assert_eq!(
            vector.as_slice(),
            &[0.1, 0.0, 7.0, 0.0, 0.5, 6.0, 65.0, 4.0, 1.0, 300.0, 15.0, 390.0, 5.0]
        );
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let mut body = valid_body();
        body.remove("LSTAT");

        let err = FeatureVector::from_json(&body).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("LSTAT"));
        assert_eq!(err.to_string(), "No LSTAT provided");
        assert_eq!(err.code(), "missing_field");
    }

    #[test]
    fn test_first_failure_wins() {
        let mut body = valid_body();
        body.remove("ZN");
        body.remove("B");

        let err = FeatureVector::from_json(&body).unwrap_err();
        assert_eq!(err.field(), "ZN");
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        assert_eq!(parse_feature("RM", &json!("6.5")).unwrap(), 6.5);
        assert_eq!(parse_feature("RM", &json!(" 1e2 ")).unwrap(), 100.0);
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        for value in [json!("abc"), json!(true), json!(null), json!([1.0]), json!({"v": 1})] {
            let err = parse_feature("NOX", &value).unwrap_err();
            assert_eq!(err.field(), "NOX");
            assert_eq!(err.code(), "invalid_field");
        }
    }

    #[test]
    fn test_non_finite_strings_are_rejected() {
        assert!(parse_feature("AGE", &json!("NaN")).is_err());
        assert!(parse_feature("AGE", &json!("inf")).is_err());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut body = valid_body();
        body.insert("PRICE".to_string(), json!("not a number"));
        assert!(FeatureVector::from_json(&body).is_ok());
    }
}
