//! 单据编号分配
//!
//! 编号形如 `PO-202501-0001`，序号来自业务计数，与已有编号冲突时顺延。

use softwear_errors::AppResult;
use sqlx::PgConnection;

use crate::db_error;

/// 一类单据编号所在的表与列
#[derive(Debug, Clone, Copy)]
pub struct NumberSeries {
    /// `pg_advisory_xact_lock` 的键，同一类单据共用
    pub lock_key: i64,
    pub table: &'static str,
    pub column: &'static str,
}

impl NumberSeries {
    pub const fn new(lock_key: i64, table: &'static str, column: &'static str) -> Self {
        Self {
            lock_key,
            table,
            column,
        }
    }

    /// 在当前事务内加锁，直到事务结束
    pub async fn lock(&self, conn: &mut PgConnection) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(self.lock_key)
            .execute(conn)
            .await
            .map_err(db_error(format!("锁定 {} 编号", self.table)))?;
        Ok(())
    }

    /// 从 `start` 开始找第一个未被占用的编号；调用前须已 `lock`
    pub async fn first_free(
        &self,
        conn: &mut PgConnection,
        start: i64,
        format: impl Fn(i64) -> String,
    ) -> AppResult<String> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
            self.table, self.column
        );
        let mut seq = start.max(1);
        loop {
            let candidate = format(seq);
            let taken: bool = sqlx::query_scalar(&sql)
                .bind(&candidate)
                .fetch_one(&mut *conn)
                .await
                .map_err(db_error(format!("检查 {} 编号", self.table)))?;
            if !taken {
                return Ok(candidate);
            }
            seq += 1;
        }
    }
}
