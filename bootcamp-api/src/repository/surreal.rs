//! SurrealDB implementation of [`Repository`]
//!
//! Filters are rendered to SurrealQL with every value bound as a parameter;
//! field paths are always escaped, so nothing from a query string is ever
//! spliced into the statement text unquoted.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use super::{
    Document, Filter, FilterOperator, FilterValue, Pagination, Repository, RepositoryError,
    RepositoryErrorKind, RepositoryOperation, RepositoryResult, SortKey,
};
use crate::surrealdb_backend::SurrealClient;

const SELECT_BY_ID: &str = "SELECT *, record::id(id) AS id FROM type::thing($tb, $key)";

/// Statement bindings, in the order they were produced
pub(crate) type Bindings = Vec<(String, Value)>;

/// A rendered `WHERE` clause and its bindings
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CompiledFilter {
    /// Empty, or ` WHERE ...`
    pub clause: String,
    pub bindings: Bindings,
}

/// Escape a dotted field path into a SurrealQL idiom
pub(crate) fn render_path(path: &str) -> RepositoryResult<String> {
    path.split('.')
        .map(|segment| {
            if segment.is_empty() {
                Err(RepositoryError::validation_failed(
                    RepositoryOperation::FindAll,
                    format!("Invalid field name '{path}'"),
                ))
            } else {
                Ok(format!(
                    "`{}`",
                    segment.replace('\\', "\\\\").replace('`', "\\`")
                ))
            }
        })
        .collect::<RepositoryResult<Vec<_>>>()
        .map(|segments| segments.join("."))
}

/// Render `filter`, treating `array_fields` with containment semantics
pub(crate) fn compile_filter(
    filter: &Filter,
    array_fields: &[&str],
) -> RepositoryResult<CompiledFilter> {
    if filter.is_empty() {
        return Ok(CompiledFilter::default());
    }

    let mut predicates = Vec::with_capacity(filter.len());
    let mut bindings = Vec::with_capacity(filter.len());

    for (index, condition) in filter.conditions().iter().enumerate() {
        let param = format!("f{index}");
        let field = render_path(&condition.field)?;
        let is_array = array_fields.contains(&condition.field.as_str());

        let predicate = match (condition.operator, is_array) {
            (FilterOperator::Equal, true) => format!("{field} CONTAINS ${param}"),
            (FilterOperator::In, true) => format!("{field} CONTAINSANY ${param}"),
            (FilterOperator::In, false) => format!("{field} INSIDE ${param}"),
            (operator, _) => format!("{field} {operator} ${param}"),
        };

        let value = match &condition.value {
            FilterValue::List(_) => condition.value.to_json(),
            single if condition.operator == FilterOperator::In => {
                Value::Array(vec![single.to_json()])
            }
            other => other.to_json(),
        };

        predicates.push(predicate);
        bindings.push((param, value));
    }

    Ok(CompiledFilter {
        clause: format!(" WHERE {}", predicates.join(" AND ")),
        bindings,
    })
}

/// Render an `ORDER BY` clause, empty when `sort` is
pub(crate) fn compile_order(sort: &[SortKey]) -> RepositoryResult<String> {
    if sort.is_empty() {
        return Ok(String::new());
    }

    let terms = sort
        .iter()
        .map(|key| Ok(format!("{} {}", render_path(&key.field)?, key.direction)))
        .collect::<RepositoryResult<Vec<_>>>()?;

    Ok(format!(" ORDER BY {}", terms.join(", ")))
}

/// Render `LIMIT .. START ..`, capped at the store's signed 64-bit range
pub(crate) fn compile_window(window: Option<Pagination>) -> String {
    const MAX: u64 = i64::MAX as u64;

    window
        .map(|w| format!(" LIMIT {} START {}", w.limit.min(MAX), w.offset.min(MAX)))
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// Repository for one document kind stored in SurrealDB
pub struct SurrealRepository<E> {
    db: SurrealClient,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SurrealRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Document> SurrealRepository<E> {
    /// Create a repository over an already connected client
    pub fn new(db: SurrealClient) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    fn error(&self, operation: RepositoryOperation, err: surrealdb::Error) -> RepositoryError {
        RepositoryError::from_surreal(operation, err).with_entity_type(E::ENTITY)
    }

    /// Run `sql` with `bindings`, surfacing per-statement errors
    pub(crate) async fn run(
        &self,
        operation: RepositoryOperation,
        sql: String,
        bindings: Bindings,
    ) -> RepositoryResult<surrealdb::Response> {
        tracing::trace!(entity = E::ENTITY, %operation, %sql, "surrealql");

        let mut query = self.db.query(sql);
        for binding in bindings {
            query = query.bind(binding);
        }

        query
            .await
            .and_then(|response| response.check())
            .map_err(|e| self.error(operation, e))
    }

    /// Run `sql` and deserialize the rows of statement `index`
    pub(crate) async fn rows<T: DeserializeOwned>(
        &self,
        operation: RepositoryOperation,
        sql: String,
        bindings: Bindings,
        index: usize,
    ) -> RepositoryResult<Vec<T>> {
        let mut response = self.run(operation, sql, bindings).await?;
        response.take(index).map_err(|e| self.error(operation, e))
    }

    fn key_bindings(id: &str) -> Bindings {
        vec![
            ("tb".to_string(), Value::from(E::TABLE)),
            ("key".to_string(), Value::from(id)),
        ]
    }

    /// Remove every entity matching `filter`
    pub async fn delete_matching(&self, filter: &Filter) -> RepositoryResult<()> {
        let compiled = compile_filter(filter, E::ARRAY_FIELDS)?;
        let sql = format!("DELETE {}{} RETURN NONE", E::TABLE, compiled.clause);
        self.run(RepositoryOperation::Delete, sql, compiled.bindings)
            .await
            .map(|_| ())
    }

    /// Merge raw fields into one record without reading it back
    pub(crate) async fn merge_fields(
        &self,
        id: &str,
        fields: Value,
    ) -> RepositoryResult<()> {
        let mut bindings = Self::key_bindings(id);
        bindings.push(("patch".to_string(), fields));
        self.run(
            RepositoryOperation::Update,
            "UPDATE type::thing($tb, $key) MERGE $patch RETURN NONE".to_string(),
            bindings,
        )
        .await
        .map(|_| ())
    }
}

impl<E: Document> Repository<E, E::Patch> for SurrealRepository<E> {
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<E>> {
        let rows: Vec<E> = self
            .rows(
                RepositoryOperation::FindById,
                SELECT_BY_ID.to_string(),
                Self::key_bindings(id),
                0,
            )
            .await
            .map_err(|e| e.with_entity_id(id))?;

        Ok(rows.into_iter().next())
    }

    async fn find_all(
        &self,
        filter: &Filter,
        sort: &[SortKey],
        window: Option<Pagination>,
    ) -> RepositoryResult<Vec<E>> {
        let compiled = compile_filter(filter, E::ARRAY_FIELDS)?;
        let order = compile_order(sort)?;
        let window = compile_window(window);

        let sql = format!(
            "SELECT *, record::id(id) AS id FROM {}{}{}{}",
            E::TABLE,
            compiled.clause,
            order,
            window
        );

        self.rows(RepositoryOperation::FindAll, sql, compiled.bindings, 0)
            .await
    }

    async fn count(&self, filter: &Filter) -> RepositoryResult<u64> {
        let compiled = compile_filter(filter, E::ARRAY_FIELDS)?;
        let sql = format!(
            "SELECT count() AS total FROM {}{} GROUP ALL",
            E::TABLE,
            compiled.clause
        );

        let rows: Vec<CountRow> = self
            .rows(RepositoryOperation::Count, sql, compiled.bindings, 0)
            .await?;

        // GROUP ALL over zero rows yields no group at all
        Ok(rows.first().map_or(0, |row| row.total))
    }

    async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn create(&self, entity: E) -> RepositoryResult<E> {
        let id = entity.id().to_string();

        let mut content = serde_json::to_value(&entity).map_err(|e| {
            RepositoryError::serialization(RepositoryOperation::Create, e.to_string())
                .with_entity_type(E::ENTITY)
        })?;
        if let Value::Object(map) = &mut content {
            map.remove("id");
        }

        let mut bindings = Self::key_bindings(&id);
        bindings.push(("content".to_string(), content));

        let sql = format!("CREATE type::thing($tb, $key) CONTENT $content RETURN NONE; {SELECT_BY_ID};");
        let rows: Vec<E> = self
            .rows(RepositoryOperation::Create, sql, bindings, 1)
            .await
            .map_err(|e| e.with_entity_id(id.as_str()))?;

        rows.into_iter().next().ok_or_else(|| {
            RepositoryError::new(
                RepositoryOperation::Create,
                RepositoryErrorKind::DatabaseError,
                "Created record was not returned",
            )
            .with_entity_type(E::ENTITY)
            .with_entity_id(id)
        })
    }

    async fn update(&self, id: &str, patch: E::Patch) -> RepositoryResult<Option<E>> {
        if !self.exists(id).await? {
            return Ok(None);
        }

        let fields = serde_json::to_value(&patch).map_err(|e| {
            RepositoryError::serialization(RepositoryOperation::Update, e.to_string())
                .with_entity_type(E::ENTITY)
                .with_entity_id(id)
        })?;

        let is_empty = matches!(&fields, Value::Object(map) if map.is_empty());
        if !is_empty {
            self.merge_fields(id, fields)
                .await
                .map_err(|e| e.with_entity_id(id))?;
        }

        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str) -> RepositoryResult<Option<E>> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        self.run(
            RepositoryOperation::Delete,
            "DELETE type::thing($tb, $key) RETURN NONE".to_string(),
            Self::key_bindings(id),
        )
        .await
        .map_err(|e| e.with_entity_id(id))?;

        Ok(Some(existing))
    }

    async fn delete_all(&self) -> RepositoryResult<u64> {
        let total = self.count(&Filter::new()).await?;
        self.run(
            RepositoryOperation::Delete,
            format!("DELETE {} RETURN NONE", E::TABLE),
            Vec::new(),
        )
        .await?;
        Ok(total)
    }
}
