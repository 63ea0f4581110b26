use std::collections::HashSet;

use uuid::Uuid;

use crate::services::error::{Result, ServiceError};

pub fn parse_id(raw: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::InvalidInput(format!("{field} is not a valid identifier")))
}

pub fn require_positive_quantity(quantity: i32) -> Result<i32> {
    if quantity <= 0 {
        return Err(ServiceError::InvalidInput(
            "quantity must be a positive integer".into(),
        ));
    }
    Ok(quantity)
}

pub fn require_non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value)
}

/// Parses a non-empty set of distinct line identifiers, keeping submission order.
pub fn parse_line_ids(raw: &[String]) -> Result<Vec<Uuid>> {
    if raw.is_empty() {
        return Err(ServiceError::InvalidInput(
            "at least one order id is required".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .map(|id| {
            let id = parse_id(id, "order_id")?;
            if !seen.insert(id) {
                return Err(ServiceError::InvalidInput(format!(
                    "order id {id} was submitted more than once"
                )));
            }
            Ok(id)
        })
        .collect()
}
