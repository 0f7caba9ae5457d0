//! 销售仓储接口

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use softwear_common::{DateRange, Pagination, UserId};
use softwear_errors::AppResult;

use super::{
    CreatedSale, DailySales, DailySalesDetails, DailySalesSummary, HourlySales, NewSale,
    PaymentMethodStat, RecentTransaction, SaleFilter, SaleReport, SaleReportItem,
    SalesDashboard, TopSellingProduct, VerificationDecision, VerificationFilter,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// 单号、明细、出库、收款在同一事务内写入
    async fn insert(&self, sale: &NewSale) -> AppResult<CreatedSale>;

    async fn list(&self, filter: &SaleFilter, pagination: Pagination) -> AppResult<Vec<SaleReport>>;

    async fn count(&self, filter: &SaleFilter) -> AppResult<u64>;

    /// `UserId::ANY` 不校验卖家
    async fn find(&self, sale_id: i32, seller: UserId) -> AppResult<Option<SaleReport>>;

    async fn items(&self, sale_id: i32) -> AppResult<Vec<SaleReportItem>>;

    // 以下按收银员统计

    async fn dashboard(&self, cashier: UserId) -> AppResult<SalesDashboard>;

    /// 只返回有销售的日期
    async fn daily(&self, cashier: UserId, range: &DateRange) -> AppResult<Vec<DailySales>>;

    async fn top_selling(&self, cashier: UserId, limit: i64) -> AppResult<Vec<TopSellingProduct>>;

    /// 未计算占比
    async fn payment_methods(&self, cashier: UserId) -> AppResult<Vec<PaymentMethodStat>>;

    async fn recent(&self, cashier: UserId, limit: i64) -> AppResult<Vec<RecentTransaction>>;

    /// 当天（UTC）按小时，只返回有销售的小时
    async fn hourly_today(&self, cashier: UserId) -> AppResult<Vec<HourlySales>>;

    async fn average_amount(&self, cashier: UserId) -> AppResult<Decimal>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// 未核对或待核对的日期，新日期在前
    async fn pending(
        &self,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<DailySalesSummary>>;

    async fn count_pending(&self, filter: &VerificationFilter) -> AppResult<u64>;

    /// 收银员不属于卖家或当天没有销售时为 None
    async fn details(
        &self,
        seller: UserId,
        cashier: UserId,
        sale_date: NaiveDate,
    ) -> AppResult<Option<DailySalesDetails>>;

    /// 收银员不属于卖家时返回 false
    async fn decide(&self, decision: &VerificationDecision) -> AppResult<bool>;

    async fn report(&self, filter: &VerificationFilter) -> AppResult<Vec<DailySalesSummary>>;
}

/// 开单后记录平台管理费
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminFeeGateway: Send + Sync {
    async fn record_admin_fee(
        &self,
        seller: UserId,
        sale_id: i32,
        sale_amount: Decimal,
    ) -> AppResult<Option<i32>>;
}
