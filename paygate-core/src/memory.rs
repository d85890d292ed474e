//! In-memory repository
//!
//! Backs local development and tests. Tracks order reads and writes so
//! callers can assert which lookups a code path performed.

use crate::error::{RepositoryError, RepositoryResult};
use crate::order::Order;
use crate::payment::{PaymentMethod, PaymentSystem};
use crate::project::{FixedPackage, Project};
use crate::repository::{FixedPackageFilter, Repository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

const TABLE_PROJECT: &str = "project";
const TABLE_ORDER: &str = "order";

/// Repository holding every record in process memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    projects: RwLock<HashMap<Uuid, Project>>,
    payment_methods: RwLock<HashMap<Uuid, PaymentMethod>>,
    payment_systems: RwLock<HashMap<Uuid, PaymentSystem>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    order_lookups: AtomicUsize,
    order_updates: AtomicUsize,
    fail_queries: AtomicBool,
    fail_updates: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_project(&self, project: Project) {
        self.projects.write().await.insert(project.id, project);
    }

    pub async fn add_payment_method(&self, method: PaymentMethod) {
        self.payment_methods.write().await.insert(method.id, method);
    }

    pub async fn add_payment_system(&self, system: PaymentSystem) {
        self.payment_systems.write().await.insert(system.id, system);
    }

    pub async fn add_order(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }

    /// Current stored copy of an order, bypassing the lookup counter
    pub async fn order(&self, id: Uuid) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    /// Number of order lookups served so far
    pub fn order_lookups(&self) -> usize {
        self.order_lookups.load(Ordering::SeqCst)
    }

    /// Number of successful order updates so far
    pub fn order_updates(&self) -> usize {
        self.order_updates.load(Ordering::SeqCst)
    }

    /// Make every lookup fail with a query error
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make every order update fail with a write error
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    fn check_query(&self, table: &'static str) -> RepositoryResult<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(RepositoryError::query(table, "query failures enabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_project_by_id(&self, id: Uuid) -> RepositoryResult<Option<Project>> {
        self.check_query(TABLE_PROJECT)?;
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn find_payment_method_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentMethod>> {
        self.check_query("payment_method")?;
        Ok(self.payment_methods.read().await.get(&id).cloned())
    }

    async fn find_payment_system_by_id(&self, id: Uuid) -> RepositoryResult<Option<PaymentSystem>> {
        self.check_query("payment_system")?;
        Ok(self.payment_systems.read().await.get(&id).cloned())
    }

    async fn find_order_by_project_order_id(
        &self,
        project_id: Uuid,
        project_order_id: &str,
    ) -> RepositoryResult<Option<Order>> {
        self.order_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_query(TABLE_ORDER)?;
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|order| {
                order.project_id == project_id
                    && order.project_order_id.as_deref() == Some(project_order_id)
            })
            .cloned())
    }

    async fn find_order_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>> {
        self.order_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_query(TABLE_ORDER)?;
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> RepositoryResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(RepositoryError::write(TABLE_ORDER, "duplicate key"));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> RepositoryResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepositoryError::write(TABLE_ORDER, "update failures enabled"));
        }

        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(stored) => {
                *stored = order.clone();
                self.order_updates.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(RepositoryError::write(TABLE_ORDER, "order not found")),
        }
    }

    async fn find_fixed_packages(
        &self,
        filter: &FixedPackageFilter,
    ) -> RepositoryResult<Vec<FixedPackage>> {
        self.check_query(TABLE_PROJECT)?;
        Ok(self
            .projects
            .read()
            .await
            .get(&filter.project_id)
            .and_then(|project| project.fixed_packages.get(&filter.region))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order(project_id: Uuid) -> Order {
        Order::new(
            project_id,
            "account",
            Money::new(Decimal::new(10, 0), Currency::USD),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find_order() {
        let repo = InMemoryRepository::new();
        let project_id = Uuid::new_v4();
        let mut order = order(project_id);
        order.project_order_id = Some("ext-1".into());

        repo.insert_order(&order).await.unwrap();
        assert!(repo.insert_order(&order).await.is_err());

        let found = repo.find_order_by_id(order.id).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(order.id));

        let by_project = repo
            .find_order_by_project_order_id(project_id, "ext-1")
            .await
            .unwrap();
        assert!(by_project.is_some());

        let other_project = repo
            .find_order_by_project_order_id(Uuid::new_v4(), "ext-1")
            .await
            .unwrap();
        assert!(other_project.is_none());

        assert_eq!(repo.order_lookups(), 3);
    }

    #[tokio::test]
    async fn test_update_failures() {
        let repo = InMemoryRepository::new();
        let order = order(Uuid::new_v4());

        assert!(repo.update_order(&order).await.is_err());

        repo.add_order(order.clone()).await;
        repo.update_order(&order).await.unwrap();
        assert_eq!(repo.order_updates(), 1);

        repo.set_fail_updates(true);
        assert!(repo.update_order(&order).await.is_err());
        assert_eq!(repo.order_updates(), 1);
    }

    #[tokio::test]
    async fn test_query_failures() {
        let repo = InMemoryRepository::new();
        repo.set_fail_queries(true);

        let result = repo.find_project_by_id(Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepositoryError::Query { .. })));
    }
}
