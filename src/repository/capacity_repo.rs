// ==========================================
// 制造运营排程系统 - 部门产能仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 部门产能配置 CRUD 与已承诺负荷快照派生
// 说明: 负荷快照每次调用重新聚合，不做任何缓存（避免陈旧读）
// ==========================================

use crate::domain::schedule::{DepartmentCapacityProfile, ScheduleSlot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// CapacityRepository - 部门产能仓储
// ==========================================

/// 部门产能仓储
/// 职责: 管理 department_capacity 与 task_assignment 表
pub struct CapacityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CapacityRepository {
    /// 创建新的仓储实例
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

    /// 查询全部部门产能配置
    pub fn list_department_capacities(
        &self,
    ) -> RepositoryResult<Vec<DepartmentCapacityProfile>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT department_code, daily_slot_count FROM department_capacity ORDER BY department_code",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DepartmentCapacityProfile {
                department_code: row.get(0)?,
                daily_slot_count: row.get(1)?,
            })
        })?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    /// 写入/更新部门产能配置
    pub fn upsert_department_capacity(
        &self,
        profile: &DepartmentCapacityProfile,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO department_capacity (department_code, daily_slot_count)
            VALUES (?1, ?2)
            ON CONFLICT(department_code) DO UPDATE SET daily_slot_count = excluded.daily_slot_count
            "#,
            params![profile.department_code, profile.daily_slot_count],
        )?;
        Ok(())
    }

    /// 派生日期范围内的已承诺负荷快照
    ///
    /// 口径: 按 (部门, 日期) 聚合 task_assignment 占位行数
    ///
    /// # 参数
    /// - start_date / end_date: 快照范围（含首尾）
    /// - department: 可选部门过滤
    pub fn list_committed_slots(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        department: Option<&str>,
    ) -> RepositoryResult<Vec<ScheduleSlot>> {
        let conn = self.get_conn()?;
        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut slots = Vec::new();
        match department {
            Some(dept) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT department_code, work_date, COUNT(*)
                    FROM task_assignment
                    WHERE work_date >= ?1 AND work_date <= ?2 AND department_code = ?3
                    GROUP BY department_code, work_date
                    ORDER BY department_code, work_date
                    "#,
                )?;
                let rows = stmt.query_map(params![start_str, end_str, dept], Self::map_slot_row)?;
                for row in rows {
                    slots.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT department_code, work_date, COUNT(*)
                    FROM task_assignment
                    WHERE work_date >= ?1 AND work_date <= ?2
                    GROUP BY department_code, work_date
                    ORDER BY department_code, work_date
                    "#,
                )?;
                let rows = stmt.query_map(params![start_str, end_str], Self::map_slot_row)?;
                for row in rows {
                    slots.push(row?);
                }
            }
        }
        Ok(slots)
    }

    /// 行映射: (department_code, work_date, count) → ScheduleSlot
    fn map_slot_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleSlot> {
        let date_str: String = row.get(1)?;
        Ok(ScheduleSlot {
            department_code: row.get(0)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            occupied_count: row.get(2)?,
        })
    }
}
