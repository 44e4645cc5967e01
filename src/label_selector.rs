//! Label selector parsing and matching
//!
//! Selector strings are parsed into `kube::core::Selector` and matched against the
//! labels of `Builder` and `Image` objects. Supported syntax:
//! - Equality: `key=value` or `key==value`
//! - Inequality: `key!=value`
//! - Set-based: `key in (value1,value2)` or `key notin (value1,value2)`
//! - Existence: `key` or `!key`
//! - Requirements joined with commas are ANDed: `key1=value1,key2 in (v2,v3)`
//!
//! Keys are an optional DNS subdomain prefix and `/` followed by a name of at
//! most 63 characters; values are such a name or empty. Anything else is an
//! `Error::InvalidSelector`.
//!
//! An empty selector matches everything.

use crate::{Error, Result};
use kube::api::ListParams;
use kube::core::{Expression, Selector, SelectorExt};
use std::collections::{BTreeMap, BTreeSet};

/// Split on commas that are not inside a value set
fn split_requirements(selector: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut depth = 0;

    for (i, ch) in selector.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                result.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < selector.len() {
        result.push(&selector[start..]);
    }

    result
}

const MAX_LABEL_NAME_LEN: usize = 63;
const MAX_KEY_PREFIX_LEN: usize = 253;

/// A label name or value: at most 63 characters, alphanumeric at both ends,
/// `-`, `_` and `.` allowed in between.
fn is_label_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            name.len() <= MAX_LABEL_NAME_LEN
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        }
        _ => false,
    }
}

/// A lowercase RFC 1123 DNS subdomain, used as the optional key prefix.
fn is_dns_subdomain(prefix: &str) -> bool {
    prefix.len() <= MAX_KEY_PREFIX_LEN
        && prefix.split('.').all(|label| {
            let bytes = label.as_bytes();
            match (bytes.first(), bytes.last()) {
                (Some(first), Some(last)) => {
                    label.len() <= MAX_LABEL_NAME_LEN
                        && (first.is_ascii_lowercase() || first.is_ascii_digit())
                        && (last.is_ascii_lowercase() || last.is_ascii_digit())
                        && bytes
                            .iter()
                            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
                }
                _ => false,
            }
        })
}

fn parse_key(requirement: &str, key: &str) -> Result<String> {
    let key = key.trim();
    let valid = match key.split_once('/') {
        Some((prefix, name)) => is_dns_subdomain(prefix) && is_label_name(name),
        None => is_label_name(key),
    };
    if !valid {
        return Err(Error::InvalidSelector(format!(
            "invalid label key {:?} in requirement: {}",
            key, requirement
        )));
    }
    Ok(key.to_string())
}

/// Values may be empty; otherwise they follow the label name rules.
fn parse_value(requirement: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if !value.is_empty() && !is_label_name(value) {
        return Err(Error::InvalidSelector(format!(
            "invalid label value {:?} in requirement: {}",
            value, requirement
        )));
    }
    Ok(value.to_string())
}

fn parse_value_set(requirement: &str, operator: &str, rest: &str) -> Result<BTreeSet<String>> {
    let inner = rest
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| {
            Error::InvalidSelector(format!("invalid '{}' syntax: {}", operator, requirement))
        })?;

    if inner.trim().is_empty() {
        return Err(Error::InvalidSelector(format!(
            "'{}' needs at least one value: {}",
            operator, requirement
        )));
    }

    inner
        .split(',')
        .map(|value| parse_value(requirement, value))
        .collect()
}

fn parse_requirement(requirement: &str) -> Result<Expression> {
    if let Some((key, rest)) = requirement.split_once(" notin ") {
        let values = parse_value_set(requirement, "notin", rest)?;
        return Ok(Expression::NotIn(parse_key(requirement, key)?, values));
    }
    if let Some((key, rest)) = requirement.split_once(" in ") {
        let values = parse_value_set(requirement, "in", rest)?;
        return Ok(Expression::In(parse_key(requirement, key)?, values));
    }
    if let Some(key) = requirement.strip_prefix('!') {
        if !key.contains('=') {
            return Ok(Expression::DoesNotExist(parse_key(requirement, key)?));
        }
    }
    if let Some((key, value)) = requirement.split_once("!=") {
        return Ok(Expression::NotEqual(
            parse_key(requirement, key)?,
            parse_value(requirement, value)?,
        ));
    }
    if let Some((key, value)) = requirement
        .split_once("==")
        .or_else(|| requirement.split_once('='))
    {
        return Ok(Expression::Equal(
            parse_key(requirement, key)?,
            parse_value(requirement, value)?,
        ));
    }
    Ok(Expression::Exists(parse_key(requirement, requirement)?))
}

/// Parse a label selector string into a `Selector`.
///
/// # Examples
///
/// ```
/// use build_service_client::label_selector::parse_label_selector;
///
/// assert!(parse_label_selector("env=prod").is_ok());
/// assert!(parse_label_selector("env in (prod,staging),!canary").is_ok());
/// assert!(parse_label_selector("env in prod").is_err());
/// ```
pub fn parse_label_selector(selector: &str) -> Result<Selector> {
    let expressions = split_requirements(selector)
        .into_iter()
        .map(str::trim)
        .filter(|requirement| !requirement.is_empty())
        .map(parse_requirement)
        .collect::<Result<Vec<_>>>()?;

    Ok(Selector::from_iter(expressions))
}

/// The label selector carried by list options; absent means everything.
pub fn from_list_params(params: &ListParams) -> Result<Selector> {
    match params.label_selector.as_deref() {
        Some(selector) => parse_label_selector(selector),
        None => Ok(Selector::default()),
    }
}

/// Match a selector against an optional label set. Missing labels are the empty set.
pub fn matches_labels(selector: &Selector, labels: Option<&BTreeMap<String, String>>) -> bool {
    match labels {
        Some(labels) => selector.matches(labels),
        None => selector.matches(&BTreeMap::new()),
    }
}

/// Match labels against a label selector string
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use build_service_client::label_selector::matches_label_selector;
///
/// let labels = BTreeMap::from([("env".to_string(), "prod".to_string())]);
///
/// assert!(matches_label_selector(&labels, "env=prod").unwrap());
/// assert!(!matches_label_selector(&labels, "env notin (prod)").unwrap());
/// ```
pub fn matches_label_selector(labels: &BTreeMap<String, String>, selector: &str) -> Result<bool> {
    let selector = parse_label_selector(selector)?;
    Ok(selector.matches(labels))
}
