use chrono::{DateTime, NaiveDate};
use email_address::EmailAddress;
use regex::Regex;
use serde_json::Value;

use crate::{
    errors::ValidationIssue,
    types::{ColumnDescriptor, ColumnType, ValidationRule},
};

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

fn type_matches(column_type: ColumnType, value: &Value) -> bool {
    match column_type {
        ColumnType::Id | ColumnType::Reference | ColumnType::Integer | ColumnType::SmallInt => value.is_i64(),
        ColumnType::Varchar(_) | ColumnType::Text | ColumnType::Password => value.is_string(),
        ColumnType::Boolean => value.is_boolean(),
        ColumnType::Date => value
            .as_str()
            .is_some_and(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()),
        ColumnType::DateTime => value
            .as_str()
            .is_some_and(|raw| DateTime::parse_from_rfc3339(raw).is_ok()),
        ColumnType::Roles => value
            .as_array()
            .is_some_and(|roles| roles.iter().all(Value::is_string)),
    }
}

fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Id | ColumnType::Reference | ColumnType::Integer | ColumnType::SmallInt => "an integer",
        ColumnType::Varchar(_) | ColumnType::Text | ColumnType::Password => "a string",
        ColumnType::Boolean => "a boolean",
        ColumnType::Date => "a date (YYYY-MM-DD)",
        ColumnType::DateTime => "an RFC 3339 timestamp",
        ColumnType::Roles => "an array of role names",
    }
}

fn validate_rule_on_value(field_name: &str, rule: &ValidationRule, value: &Value, issues: &mut Vec<ValidationIssue>) {
    match rule {
        ValidationRule::Length { min, max } => {
            if let Some(len) = value.as_str().map(|s| s.chars().count()) {
                if let Some(min_len) = min
                    && len < *min_len
                {
                    issues.push(ValidationIssue::new(
                        field_name,
                        "validation.length",
                        format!("length must be at least {min_len}"),
                    ));
                }
                if let Some(max_len) = max
                    && len > *max_len
                {
                    issues.push(ValidationIssue::new(
                        field_name,
                        "validation.length",
                        format!("length must be at most {max_len}"),
                    ));
                }
            }
        }
        ValidationRule::Regex { pattern } => {
            if let Some(candidate) = value.as_str()
                && Regex::new(pattern).map(|regex| !regex.is_match(candidate)).unwrap_or(false)
            {
                issues.push(ValidationIssue::new(
                    field_name,
                    "validation.regex",
                    format!("value does not match pattern {pattern}"),
                ));
            }
        }
        ValidationRule::Enum { allowed } => {
            if let Some(candidate) = value.as_i64()
                && !allowed.contains(&candidate)
            {
                issues.push(ValidationIssue::new(
                    field_name,
                    "validation.enum",
                    format!("value must be one of {allowed:?}"),
                ));
            }
        }
        ValidationRule::Email => {
            if let Some(candidate) = value.as_str()
                && !is_valid_email(candidate)
            {
                issues.push(ValidationIssue::new(
                    field_name,
                    "validation.email",
                    "value must be a valid email address",
                ));
            }
        }
    }
}

/// Checks one column assignment: nullability, type, declared length and rules.
pub fn validate_column_value(column: &ColumnDescriptor, value: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if value.is_null() {
        if !column.nullable {
            issues.push(ValidationIssue::new(column.name, "validation.required", "field is required"));
        }
        return issues;
    }
    if !type_matches(column.column_type, value) {
        issues.push(ValidationIssue::new(
            column.name,
            "validation.type",
            format!("value must be {}", type_name(column.column_type)),
        ));
        return issues;
    }
    if let ColumnType::Varchar(max) = column.column_type {
        validate_rule_on_value(
            column.name,
            &ValidationRule::Length { min: None, max: Some(max) },
            value,
            &mut issues,
        );
    }
    for rule in column.validations {
        validate_rule_on_value(column.name, rule, value, &mut issues);
    }
    issues
}
