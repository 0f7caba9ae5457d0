//! 销售业务处理

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use softwear_common::{DateRange, PagedResult, Pagination, UserId};
use softwear_errors::AppResult;
use tracing::{error, info};

use crate::domain::{
    AdminFeeGateway, CreatedSale, DailySales, HourlySales, PaymentMethodStat, RecentTransaction,
    SaleFilter, SaleReport, SaleReportItem, SaleRepository, SalesDashboard, TopSellingProduct,
    fill_daily_sales, fill_hours, rank_payment_methods,
};

use super::commands::CreateSaleCommand;

const MAX_TOP_PRODUCTS: i64 = 100;
const MAX_RECENT_TRANSACTIONS: i64 = 50;

pub struct ServiceHandler {
    sales: Arc<dyn SaleRepository>,
    admin_fees: Arc<dyn AdminFeeGateway>,
}

impl ServiceHandler {
    pub fn new(sales: Arc<dyn SaleRepository>, admin_fees: Arc<dyn AdminFeeGateway>) -> Self {
        Self { sales, admin_fees }
    }

    /// 开单；管理费写入失败只记日志，不影响已提交的销售
    pub async fn create_sale(&self, cmd: CreateSaleCommand) -> AppResult<CreatedSale> {
        let sale = cmd.validate()?;
        let created = self.sales.insert(&sale).await?;
        info!(
            sale_id = created.id,
            sale_number = %created.sale_number,
            cashier = sale.cashier.0,
            total = %created.total,
            method = %sale.payment_method,
            "Sale created"
        );

        if let Err(e) = self
            .admin_fees
            .record_admin_fee(created.seller, created.id, created.total)
            .await
        {
            error!(sale_id = created.id, seller = created.seller.0, error = %e, "Failed to record admin fee");
        }
        Ok(created)
    }

    pub async fn list_sales(
        &self,
        filter: &SaleFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<SaleReport>> {
        let items = self.sales.list(filter, pagination).await?;
        let total = self.sales.count(filter).await?;
        Ok(PagedResult::new(items, total, &pagination))
    }

    pub async fn count_sales(&self, filter: &SaleFilter) -> AppResult<u64> {
        self.sales.count(filter).await
    }

    pub async fn sale(&self, sale_id: i32, seller: UserId) -> AppResult<Option<SaleReport>> {
        self.sales.find(sale_id, seller).await
    }

    pub async fn sale_items(&self, sale_id: i32) -> AppResult<Vec<SaleReportItem>> {
        self.sales.items(sale_id).await
    }

    // ---- 收银员看板 ----

    pub async fn dashboard_stats(&self, cashier: UserId) -> AppResult<SalesDashboard> {
        self.sales.dashboard(cashier).await
    }

    pub async fn daily_sales(&self, cashier: UserId, days: u32) -> AppResult<Vec<DailySales>> {
        let range = DateRange::last_days(Utc::now().date_naive(), days);
        let data = self.sales.daily(cashier, &range).await?;
        Ok(fill_daily_sales(&range, &data))
    }

    pub async fn top_selling_products(
        &self,
        cashier: UserId,
        top: i64,
    ) -> AppResult<Vec<TopSellingProduct>> {
        self.sales
            .top_selling(cashier, top.clamp(1, MAX_TOP_PRODUCTS))
            .await
    }

    pub async fn payment_method_stats(&self, cashier: UserId) -> AppResult<Vec<PaymentMethodStat>> {
        Ok(rank_payment_methods(self.sales.payment_methods(cashier).await?))
    }

    pub async fn recent_transactions(
        &self,
        cashier: UserId,
        count: i64,
    ) -> AppResult<Vec<RecentTransaction>> {
        self.sales
            .recent(cashier, count.clamp(1, MAX_RECENT_TRANSACTIONS))
            .await
    }

    pub async fn hourly_sales(&self, cashier: UserId) -> AppResult<Vec<HourlySales>> {
        Ok(fill_hours(&self.sales.hourly_today(cashier).await?))
    }

    pub async fn average_transaction_value(&self, cashier: UserId) -> AppResult<Decimal> {
        self.sales.average_amount(cashier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SaleItemInput;
    use crate::domain::{MockAdminFeeGateway, MockSaleRepository, PaymentMethod};
    use softwear_errors::AppError;

    const CASHIER: UserId = UserId(11);
    const SELLER: UserId = UserId(3);

    fn cash_sale() -> CreateSaleCommand {
        CreateSaleCommand {
            cashier: CASHIER,
            items: vec![SaleItemInput {
                variant_id: 1,
                size_id: None,
                color_id: None,
                quantity: 3,
                price: Decimal::new(25000, 2),
            }],
            payment_method: "Cash".to_string(),
            amount_paid: Decimal::new(100000, 2),
            reference_number: None,
        }
    }

    fn created() -> CreatedSale {
        CreatedSale {
            id: 90,
            sale_number: "SALE-20250101-0001".to_string(),
            seller: SELLER,
            total: Decimal::new(75000, 2),
        }
    }

    #[tokio::test]
    async fn test_create_sale_records_admin_fee_for_seller() {
        let mut sales = MockSaleRepository::new();
        sales
            .expect_insert()
            .withf(|s| {
                s.payment_method == PaymentMethod::Cash && s.change_given == Decimal::new(25000, 2)
            })
            .returning(|_| Ok(created()));
        let mut fees = MockAdminFeeGateway::new();
        fees.expect_record_admin_fee()
            .withf(|seller, sale_id, amount| {
                *seller == SELLER && *sale_id == 90 && *amount == Decimal::new(75000, 2)
            })
            .times(1)
            .returning(|_, _, _| Ok(Some(1)));

        let sale = ServiceHandler::new(Arc::new(sales), Arc::new(fees))
            .create_sale(cash_sale())
            .await
            .unwrap();
        assert_eq!(sale.id, 90);
    }

    #[tokio::test]
    async fn test_admin_fee_failure_keeps_sale() {
        let mut sales = MockSaleRepository::new();
        sales.expect_insert().returning(|_| Ok(created()));
        let mut fees = MockAdminFeeGateway::new();
        fees.expect_record_admin_fee()
            .returning(|_, _, _| Err(AppError::database("connection reset")));

        let result = ServiceHandler::new(Arc::new(sales), Arc::new(fees))
            .create_sale(cash_sale())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_sale_is_not_written() {
        let mut sales = MockSaleRepository::new();
        sales.expect_insert().never();
        let mut fees = MockAdminFeeGateway::new();
        fees.expect_record_admin_fee().never();

        let mut cmd = cash_sale();
        cmd.amount_paid = Decimal::new(100, 2);
        let err = ServiceHandler::new(Arc::new(sales), Arc::new(fees))
            .create_sale(cmd)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_hourly_sales_zero_filled() {
        let mut sales = MockSaleRepository::new();
        sales.expect_hourly_today().returning(|_| {
            Ok(vec![HourlySales {
                hour: 9,
                count: 2,
                amount: Decimal::new(5000, 2),
            }])
        });

        let hours = ServiceHandler::new(Arc::new(sales), Arc::new(MockAdminFeeGateway::new()))
            .hourly_sales(CASHIER)
            .await
            .unwrap();
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[9].count, 2);
    }

    #[tokio::test]
    async fn test_top_selling_limit_is_clamped() {
        let mut sales = MockSaleRepository::new();
        sales
            .expect_top_selling()
            .withf(|_, limit| *limit == MAX_TOP_PRODUCTS)
            .returning(|_, _| Ok(vec![]));

        ServiceHandler::new(Arc::new(sales), Arc::new(MockAdminFeeGateway::new()))
            .top_selling_products(CASHIER, 10_000)
            .await
            .unwrap();
    }
}
