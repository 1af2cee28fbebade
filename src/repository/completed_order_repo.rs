// ==========================================
// 制造运营排程系统 - 历史完工订单仓储
// ==========================================
// 红线: Repository 不含业务逻辑; 完工记录对引擎只读
// 存储: completed_order 表 (物料清单与阶段工期为 JSON 列)
// ==========================================

use crate::domain::order::{CompletedOrderRecord, MaterialLine, OrderProfile};
use crate::domain::types::{ComplexityTier, PriorityTier, Stage};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CompletedOrderRepository - 历史完工订单仓储
// ==========================================

/// 历史完工订单仓储
/// 职责: 管理 completed_order 表的读取与写入
pub struct CompletedOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompletedOrderRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        let conn = Connection::open(&db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询历史完工订单列表（按完工日期升序）
    ///
    /// # 参数
    /// - limit: 最大返回条数（None 表示不限制）
    ///
    /// # 返回
    /// - Ok(Vec<CompletedOrderRecord>): 完工订单列表
    /// - Err: 数据库错误
    pub fn list_completed_orders(
        &self,
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<CompletedOrderRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                order_id, complexity, priority, technical_attribute_count,
                material_lines, actual_duration_days, per_stage_days, completed_date
            FROM completed_order
            ORDER BY completed_date ASC
            LIMIT ?1
            "#,
        )?;

        let limit_value: i64 = limit.map(|v| v as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![limit_value], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                order_id,
                complexity,
                priority,
                technical_attribute_count,
                material_lines_json,
                actual_duration_days,
                per_stage_json,
                completed_date_str,
            ) = row?;

            let material_lines: Vec<MaterialLine> = serde_json::from_str(&material_lines_json)?;
            let stage_map: BTreeMap<String, i64> = serde_json::from_str(&per_stage_json)?;
            let per_stage_durations: Vec<(Stage, i64)> = stage_map
                .into_iter()
                .filter_map(|(key, days)| Stage::from_str(&key).map(|s| (s, days)))
                .collect();

            records.push(CompletedOrderRecord {
                order_id,
                profile: OrderProfile {
                    complexity_tier: ComplexityTier::from_str(&complexity),
                    priority_tier: PriorityTier::from_str(&priority),
                    material_lines,
                    technical_attribute_count: technical_attribute_count.max(0) as u32,
                },
                actual_duration_days,
                per_stage_durations,
                completed_date: NaiveDate::parse_from_str(&completed_date_str, "%Y-%m-%d")
                    .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            });
        }
        Ok(records)
    }

    /// 统计完工订单条数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM completed_order", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// 写入一条完工订单（由外部协作方在订单完工时调用）
    pub fn insert(&self, record: &CompletedOrderRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let material_lines_json = serde_json::to_string(&record.profile.material_lines)?;
        let stage_map: BTreeMap<&str, i64> = record
            .per_stage_durations
            .iter()
            .map(|(stage, days)| (stage.to_db_str(), *days))
            .collect();
        let per_stage_json = serde_json::to_string(&stage_map)?;

        conn.execute(
            r#"
            INSERT INTO completed_order (
                order_id, complexity, priority, technical_attribute_count,
                material_lines, actual_duration_days, per_stage_days, completed_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.order_id,
                record.profile.complexity_tier.to_db_str(),
                record.profile.priority_tier.to_db_str(),
                record.profile.technical_attribute_count as i64,
                material_lines_json,
                record.actual_duration_days,
                per_stage_json,
                record.completed_date.format("%Y-%m-%d").to_string(),
            ],
        )?;
        Ok(())
    }
}
