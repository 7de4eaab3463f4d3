//! Query-string keys to a structural filter
//!
//! `field=value` is equality, `field[op]=value` with op in `gt`, `gte`, `lt`,
//! `lte`, `in` is the matching comparison. `in` takes a comma separated list
//! and repeated keys accumulate into it. Any other bracketed suffix is kept
//! as part of a literal field name and compared for equality.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{QueryParams, RESERVED_KEYS};
use crate::repository::{Filter, FilterCondition, FilterOperator, FilterValue};

static BRACKETED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<field>[^\[\]]+)\[(?P<op>[^\[\]]+)\]$").expect("valid operator key pattern")
});

/// Translate every non-reserved key into a filter condition
pub fn translate(params: &QueryParams) -> Filter {
    params
        .pairs()
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .fold(Vec::new(), fold_pair)
        .into_iter()
        .collect()
}

fn fold_pair(
    mut conditions: Vec<FilterCondition>,
    (key, value): &(String, String),
) -> Vec<FilterCondition> {
    match split_key(key) {
        (field, Some(FilterOperator::In)) => {
            let values = value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(FilterValue::infer);

            let existing = conditions
                .iter_mut()
                .find(|c| c.field == field && c.operator == FilterOperator::In);

            match existing {
                Some(FilterCondition {
                    value: FilterValue::List(list),
                    ..
                }) => list.extend(values),
                _ => conditions.push(FilterCondition::is_in(field, values.collect())),
            }
        }
        (field, Some(operator)) => {
            conditions.push(FilterCondition::new(field, operator, FilterValue::infer(value)))
        }
        (field, None) => conditions.push(FilterCondition::eq(field, FilterValue::infer(value))),
    }

    conditions
}

/// Split `field[op]` into the field and a recognized operator
fn split_key(key: &str) -> (&str, Option<FilterOperator>) {
    BRACKETED
        .captures(key)
        .and_then(|caps| {
            let operator = FilterOperator::from_keyword(caps.name("op")?.as_str())?;
            Some((caps.name("field")?.as_str(), Some(operator)))
        })
        .unwrap_or((key, None))
}
