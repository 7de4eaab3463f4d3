//! Storage layer
//!
//! - [`Repository`]: CRUD contract used by handlers and the list pipeline
//! - [`Filter`], [`SortKey`], [`Pagination`]: structural query inputs
//! - [`SurrealRepository`]: the SurrealDB implementation
//! - [`RepositoryError`]: structured failures with operation context

mod bootcamps;
mod courses;
mod error;
mod pagination;
mod surreal;
mod traits;

pub use bootcamps::BootcampRepository;
pub use courses::{CourseRepository, TuitionStats};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult};
pub use pagination::{
    Filter, FilterCondition, FilterOperator, FilterValue, OrderDirection, Pagination, SortKey,
};
pub use surreal::SurrealRepository;
pub use traits::{Document, Repository};
