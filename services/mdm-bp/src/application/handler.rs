//! 供应商业务处理

use std::sync::Arc;

use softwear_common::{PagedResult, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::{Supplier, SupplierFilter, SupplierOption, SupplierRepository, SupplierStatus};

use super::commands::{CreateSupplierCommand, UpdateSupplierCommand};

/// 供应商列表查询
#[derive(Debug, Clone, Default)]
pub struct ListSuppliersQuery {
    pub owner: UserId,
    pub search: Option<String>,
    pub status: Option<SupplierStatus>,
    pub archived: bool,
    pub pagination: Pagination,
}

impl ListSuppliersQuery {
    fn filter(&self) -> SupplierFilter {
        SupplierFilter {
            search: self.search.clone(),
            status: self.status,
            archived: self.archived,
        }
    }
}

pub struct ServiceHandler {
    repo: Arc<dyn SupplierRepository>,
}

impl ServiceHandler {
    pub fn new(repo: Arc<dyn SupplierRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_suppliers(&self, query: &ListSuppliersQuery) -> AppResult<PagedResult<Supplier>> {
        let filter = query.filter();
        let items = self.repo.list(query.owner, &filter, query.pagination).await?;
        let total = self.repo.count(query.owner, &filter).await?;
        Ok(PagedResult::new(items, total, &query.pagination))
    }

    pub async fn count_suppliers(&self, query: &ListSuppliersQuery) -> AppResult<u64> {
        self.repo.count(query.owner, &query.filter()).await
    }

    pub async fn supplier_details(
        &self,
        owner: UserId,
        id: i32,
        archived: bool,
    ) -> AppResult<Option<Supplier>> {
        self.repo.find(owner, id, archived).await
    }

    pub async fn create_supplier(&self, cmd: CreateSupplierCommand) -> AppResult<i32> {
        let draft = cmd.input.to_draft()?;
        let id = self.repo.insert(cmd.owner, &draft).await?;
        info!(
            id,
            owner = cmd.owner.0,
            company = %draft.company_name,
            with_address = draft.address.is_some(),
            "Supplier created"
        );
        Ok(id)
    }

    pub async fn update_supplier(&self, cmd: UpdateSupplierCommand) -> AppResult<()> {
        let draft = cmd.input.to_draft()?;
        if !self.repo.update(cmd.owner, cmd.id, &draft).await? {
            return Err(AppError::not_found(format!(
                "供应商 {} 不存在或已归档",
                cmd.id
            )));
        }
        info!(id = cmd.id, status = %draft.status, "Supplier updated");
        Ok(())
    }

    pub async fn archive_supplier(&self, owner: UserId, id: i32) -> AppResult<()> {
        if !self.repo.set_archived(owner, id, true).await? {
            return Err(AppError::not_found(format!("供应商 {} 不存在或已归档", id)));
        }
        info!(id, "Supplier archived");
        Ok(())
    }

    pub async fn restore_supplier(&self, owner: UserId, id: i32) -> AppResult<()> {
        if !self.repo.set_archived(owner, id, false).await? {
            return Err(AppError::not_found(format!("已归档的供应商 {} 不存在", id)));
        }
        info!(id, "Supplier restored");
        Ok(())
    }

    pub async fn active_supplier_options(&self, owner: UserId) -> AppResult<Vec<SupplierOption>> {
        self.repo.active_options(owner).await
    }
}
