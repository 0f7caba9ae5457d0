//! 每日销售核对

use std::sync::Arc;

use chrono::NaiveDate;
use softwear_common::{PagedResult, Pagination, UserId};
use softwear_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::{
    DailySalesDetails, DailySalesSummary, VerificationDecision, VerificationFilter,
    VerificationRepository, VerificationStatus,
};

pub struct VerificationHandler {
    verifications: Arc<dyn VerificationRepository>,
}

impl VerificationHandler {
    pub fn new(verifications: Arc<dyn VerificationRepository>) -> Self {
        Self { verifications }
    }

    pub async fn pending_daily_sales(
        &self,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<DailySalesSummary>> {
        let items = self.verifications.pending(filter, pagination).await?;
        let total = self.verifications.count_pending(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_pending_daily_sales(&self, filter: &VerificationFilter) -> AppResult<u64> {
        self.verifications.count_pending(filter).await
    }

    pub async fn daily_sales_details(
        &self,
        seller: UserId,
        cashier: UserId,
        sale_date: NaiveDate,
    ) -> AppResult<Option<DailySalesDetails>> {
        self.verifications.details(seller, cashier, sale_date).await
    }

    pub async fn approve_daily_sales(
        &self,
        seller: UserId,
        cashier: UserId,
        sale_date: NaiveDate,
        approved_by: UserId,
    ) -> AppResult<()> {
        self.decide(seller, cashier, sale_date, approved_by, VerificationStatus::Approved)
            .await
    }

    pub async fn reject_daily_sales(
        &self,
        seller: UserId,
        cashier: UserId,
        sale_date: NaiveDate,
        rejected_by: UserId,
    ) -> AppResult<()> {
        self.decide(seller, cashier, sale_date, rejected_by, VerificationStatus::Rejected)
            .await
    }

    /// 全部日期，可按状态过滤
    pub async fn daily_sales_report(
        &self,
        filter: &VerificationFilter,
    ) -> AppResult<Vec<DailySalesSummary>> {
        self.verifications.report(filter).await
    }

    async fn decide(
        &self,
        seller: UserId,
        cashier: UserId,
        sale_date: NaiveDate,
        verified_by: UserId,
        status: VerificationStatus,
    ) -> AppResult<()> {
        let decision = VerificationDecision {
            seller,
            cashier,
            sale_date,
            verified_by,
            status,
        };
        if !self.verifications.decide(&decision).await? {
            return Err(AppError::not_found(format!(
                "收银员 {} 不属于卖家 {}",
                cashier.0, seller.0
            )));
        }
        info!(
            cashier = cashier.0,
            %sale_date,
            %status,
            verified_by = verified_by.0,
            "Daily sales verified"
        );
        Ok(())
    }
}
