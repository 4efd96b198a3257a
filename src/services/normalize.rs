use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// Object fields checked, in order, before falling back to the first array.
const WRAPPER_FIELDS: [&str; 2] = ["movies", "recommendations"];

/// Coerces a provider reply into a flat list of movie records.
///
/// Accepts a bare array, an object wrapping the array under `movies` or
/// `recommendations`, or failing those, the first array-valued field in
/// document order. Individual records are not validated.
pub fn normalize(raw: Value) -> AppResult<Vec<MovieRecord>> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(mut fields) => {
            let wrapped = WRAPPER_FIELDS
                .iter()
                .find(|name| matches!(fields.get(**name), Some(Value::Array(_))))
                .and_then(|name| fields.remove(*name));

            match wrapped.or_else(|| fields.into_iter().map(|(_, v)| v).find(Value::is_array)) {
                Some(Value::Array(items)) => items,
                _ => return Err(AppError::UnrecognizedResponseShape),
            }
        }
        _ => return Err(AppError::UnrecognizedResponseShape),
    };

    Ok(records_from_values(items))
}

pub fn records_from_values(items: Vec<Value>) -> Vec<MovieRecord> {
    items.into_iter().map(MovieRecord::from_value).collect()
}
