use serde_json::Value;
use tracing::debug;

use super::{translate, PaginationDescriptor, Paginator, QueryParams, Shape};
use crate::{
    error::{Error, Result},
    repository::{Document, Filter, FilterCondition, Repository},
};

/// A fully parsed list request
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Filter,
    pub shape: Shape,
    pub paginator: Paginator,
}

/// One page of shaped items
#[derive(Debug, Clone)]
pub struct ListPage {
    pub items: Vec<Value>,
    /// Matches before windowing
    pub total: u64,
    pub pagination: PaginationDescriptor,
}

impl ListQuery {
    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            filter: translate(params),
            shape: Shape::from_params(params),
            paginator: Paginator::from_params(params),
        }
    }

    /// Parse a raw query string
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        QueryParams::parse(raw).map(|params| Self::from_params(&params))
    }

    /// Restrict to children of one parent, on top of the client's filter
    #[must_use]
    pub fn scoped_to(mut self, condition: FilterCondition) -> Self {
        self.filter = self.filter.and(condition);
        self
    }

    /// Count, then fetch the window.
    ///
    /// The two reads are separate round trips. A write landing between them
    /// can make `total` and the descriptor disagree with `items`.
    pub async fn execute<E, R>(&self, repository: &R) -> Result<ListPage>
    where
        E: Document,
        R: Repository<E, E::Patch>,
    {
        let total = repository.count(&self.filter).await?;

        let entities = repository
            .find_all(&self.filter, self.shape.sort(), Some(self.paginator.window()))
            .await?;

        let items = entities
            .iter()
            .map(|entity| {
                serde_json::to_value(entity)
                    .map(|value| self.shape.project(value))
                    .map_err(|e| Error::Internal(format!("Failed to serialize {}: {e}", E::ENTITY)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            entity = E::ENTITY,
            total,
            returned = items.len(),
            page = self.paginator.page(),
            "List query executed"
        );

        Ok(ListPage {
            items,
            total,
            pagination: self.paginator.describe(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Pagination, RepositoryResult, SortKey};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Item {
        id: String,
        name: String,
        rank: i64,
    }

    impl Document for Item {
        type Patch = Value;
        const TABLE: &'static str = "item";
        const ENTITY: &'static str = "Item";

        fn id(&self) -> &str {
            &self.id
        }
    }

    /// Records the calls made by the executor
    #[derive(Default)]
    struct Recording {
        items: Vec<Item>,
        calls: Mutex<Vec<String>>,
    }

    impl Repository<Item, Value> for Recording {
        async fn find_by_id(&self, _id: &str) -> RepositoryResult<Option<Item>> {
            unimplemented!()
        }

        async fn find_all(
            &self,
            filter: &Filter,
            sort: &[SortKey],
            window: Option<Pagination>,
        ) -> RepositoryResult<Vec<Item>> {
            let window = window.unwrap_or(Pagination::new(0, u64::MAX));
            self.calls.lock().unwrap().push(format!(
                "find_all filters={} sort={} offset={} limit={}",
                filter.len(),
                sort.len(),
                window.offset,
                window.limit
            ));
            Ok(self
                .items
                .iter()
                .skip(window.offset as usize)
                .take(window.limit as usize)
                .cloned()
                .collect())
        }

        async fn count(&self, filter: &Filter) -> RepositoryResult<u64> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("count filters={}", filter.len()));
            Ok(self.items.len() as u64)
        }

        async fn exists(&self, _id: &str) -> RepositoryResult<bool> {
            unimplemented!()
        }

        async fn create(&self, entity: Item) -> RepositoryResult<Item> {
            Ok(entity)
        }

        async fn update(&self, _id: &str, _patch: Value) -> RepositoryResult<Option<Item>> {
            unimplemented!()
        }

        async fn delete(&self, _id: &str) -> RepositoryResult<Option<Item>> {
            unimplemented!()
        }

        async fn delete_all(&self) -> RepositoryResult<u64> {
            unimplemented!()
        }
    }

    fn repository(n: i64) -> Recording {
        Recording {
            items: (1..=n)
                .map(|i| Item {
                    id: format!("i{i}"),
                    name: format!("item {i}"),
                    rank: i,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_counts_before_fetching_window() {
        let repo = repository(5);
        let query = ListQuery::parse(Some("rank[gte]=1&sort=-rank&page=2&limit=2")).unwrap();

        let page = query.execute::<Item, _>(&repo).await.unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0]["id"], "i3");
        assert_eq!(page.pagination.next_page, Some(3));
        assert_eq!(page.pagination.prev_page, Some(1));
        assert_eq!(
            *repo.calls.lock().unwrap(),
            vec![
                "count filters=1".to_string(),
                "find_all filters=1 sort=1 offset=2 limit=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_projection_applied_to_items() {
        let repo = repository(1);
        let page = ListQuery::parse(Some("select=name"))
            .unwrap()
            .execute::<Item, _>(&repo)
            .await
            .unwrap();

        assert_eq!(page.items, vec![json!({"id": "i1", "name": "item 1"})]);
    }

    #[tokio::test]
    async fn test_scoped_to_adds_condition() {
        let repo = repository(0);
        let query = ListQuery::parse(Some("rank[lt]=3"))
            .unwrap()
            .scoped_to(FilterCondition::eq("parent", "p1"));
        assert!(query.filter.mentions("parent"));

        let page = query.execute::<Item, _>(&repo).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.next_page, None);
        assert_eq!(page.pagination.prev_page, None);
        assert_eq!(repo.calls.lock().unwrap()[0], "count filters=2");
    }
}
