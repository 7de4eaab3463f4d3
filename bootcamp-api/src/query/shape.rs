use serde_json::{Map, Value};

use super::QueryParams;
use crate::repository::SortKey;

/// Field selection and ordering for a list read.
///
/// `select` and `sort` are comma separated field lists. A `-` prefix on a
/// sort field orders it descending. Without `sort` the store's natural order
/// applies, which for SurrealDB is record key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    projection: Option<Vec<String>>,
    sort: Vec<SortKey>,
}

impl Shape {
    pub fn new(select: &str, sort: &str) -> Self {
        let projection: Vec<String> = split_list(select).map(str::to_string).collect();

        Self {
            projection: (!projection.is_empty()).then_some(projection),
            sort: split_list(sort)
                .filter_map(|field| match field.strip_prefix('-') {
                    Some(rest) if !rest.is_empty() => Some(SortKey::desc(rest)),
                    Some(_) => None,
                    None => Some(SortKey::asc(field)),
                })
                .collect(),
        }
    }

    pub fn from_params(params: &QueryParams) -> Self {
        Self::new(
            params.last("select").unwrap_or_default(),
            params.last("sort").unwrap_or_default(),
        )
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    /// Keep only the selected fields (plus `id`) of a serialized entity
    pub fn project(&self, document: Value) -> Value {
        let (Some(fields), Value::Object(source)) = (&self.projection, &document) else {
            return document;
        };

        let mut target = Map::new();
        if let Some(id) = source.get("id") {
            target.insert("id".to_string(), id.clone());
        }
        for field in fields {
            let path: Vec<&str> = field.split('.').collect();
            copy_path(source, &mut target, &path);
        }

        Value::Object(target)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn copy_path(source: &Map<String, Value>, target: &mut Map<String, Value>, path: &[&str]) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    let Some(value) = source.get(*head) else {
        return;
    };

    if rest.is_empty() {
        target.insert((*head).to_string(), value.clone());
        return;
    }

    if let Value::Object(inner_source) = value {
        let entry = target
            .entry((*head).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(inner_target) = entry {
            copy_path(inner_source, inner_target, rest);
        }
    }
}
