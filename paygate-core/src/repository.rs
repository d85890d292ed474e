//! Storage boundary consumed by admission and notification handling

use crate::error::RepositoryResult;
use crate::order::Order;
use crate::payment::{PaymentMethod, PaymentSystem};
use crate::project::{FixedPackage, Project};
use async_trait::async_trait;
use uuid::Uuid;

/// Filters for a fixed-package lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPackageFilter {
    pub project_id: Uuid,
    pub region: String,
}

/// Repository trait
///
/// Implemented by the storage layer. Every lookup returns `Ok(None)` when the
/// record does not exist and `Err` only when the query itself failed.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_project_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>>;

    async fn find_payment_method_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentMethod>>;

    async fn find_payment_system_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentSystem>>;

    /// Find an order by the project's own order identifier
    async fn find_order_by_project_order_id(
        &self,
        project_id: Uuid,
        project_order_id: &str,
    ) -> RepositoryResult<Option<Order>>;

    async fn find_order_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>>;

    async fn insert_order(&self, order: &Order) -> RepositoryResult<()>;

    /// Replace a stored order by primary key
    async fn update_order(&self, order: &Order) -> RepositoryResult<()>;

    /// Fixed packages of a project for one region, in catalogue order
    async fn find_fixed_packages(
        &self,
        filter: &FixedPackageFilter,
    ) -> RepositoryResult<Vec<FixedPackage>>;
}
