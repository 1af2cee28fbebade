// ==========================================
// 制造运营排程系统 - 排程计划仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 工期预估 / 生产排程 / 延期上报的持久化与任务查询
// 说明: 排程落库与日粒度占位在同一事务内提交——
//       原子占位由本仓储（持久化协作方）保证，引擎只做计算
// ==========================================

use crate::domain::delay::DelayReport;
use crate::domain::estimate::{DurationEstimate, StageDays};
use crate::domain::schedule::ProductionSchedule;
use crate::domain::task::ProductionTask;
use crate::domain::types::{ConfidenceTier, EstimateMethod, Stage, TaskStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 排程任务工时折算: 每个占位日按正常工时计
const HOURS_PER_SCHEDULED_DAY: f64 = 8.0;

// ==========================================
// PlanRepository - 排程计划仓储
// ==========================================
pub struct PlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanRepository {
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

    // ==========================================
    // 工期预估持久化
    // ==========================================

    /// 持久化工期预估
    ///
    /// # 返回
    /// 生成的 estimate_id
    pub fn save_estimate(
        &self,
        order_id: &str,
        estimate: &DurationEstimate,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let estimate_id = Uuid::new_v4().to_string();

        let stage_map: BTreeMap<&str, i64> = estimate
            .per_stage_days
            .iter()
            .map(|s| (s.stage.to_db_str(), s.days))
            .collect();
        let per_stage_json = serde_json::to_string(&stage_map)?;

        conn.execute(
            r#"
            INSERT INTO duration_estimate (
                estimate_id, order_id, total_days, per_stage_days,
                confidence, method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                estimate_id,
                order_id,
                estimate.total_days,
                per_stage_json,
                estimate.confidence.to_db_str(),
                estimate.method.to_db_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(estimate_id)
    }

    /// 查询订单最近一次工期预估
    pub fn find_latest_estimate(
        &self,
        order_id: &str,
    ) -> RepositoryResult<Option<DurationEstimate>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT total_days, per_stage_days, confidence, method
                FROM duration_estimate
                WHERE order_id = ?1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                params![order_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((total_days, per_stage_json, confidence, method)) => {
                let stage_map: BTreeMap<String, i64> = serde_json::from_str(&per_stage_json)?;
                // 阶段按工序顺序还原
                let per_stage_days: Vec<StageDays> = Stage::ALL
                    .iter()
                    .filter_map(|stage| {
                        stage_map
                            .get(stage.to_db_str())
                            .map(|days| StageDays { stage: *stage, days: *days })
                    })
                    .collect();
                Ok(Some(DurationEstimate {
                    total_days,
                    per_stage_days,
                    confidence: ConfidenceTier::from_str(&confidence),
                    method: EstimateMethod::from_str(&method),
                }))
            }
        }
    }

    // ==========================================
    // 生产排程持久化
    // ==========================================

    /// 持久化生产排程（同一事务内写入排程头/阶段/任务与日粒度占位）
    ///
    /// # 返回
    /// 生成的 schedule_id
    pub fn save_schedule(&self, schedule: &ProductionSchedule) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let schedule_id = Uuid::new_v4().to_string();
        tx.execute(
            r#"
            INSERT INTO production_schedule (
                schedule_id, order_id, start_date, end_date,
                conflict_count, health, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                schedule_id,
                schedule.order_id,
                schedule.start_date.format("%Y-%m-%d").to_string(),
                schedule.end_date.format("%Y-%m-%d").to_string(),
                schedule.conflict_count,
                schedule.health.to_db_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        for (seq_no, assignment) in schedule.stages.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO schedule_stage (
                    schedule_id, seq_no, stage, department_code, start_date, end_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    schedule_id,
                    seq_no as i64 + 1,
                    assignment.stage.to_db_str(),
                    assignment.department_code,
                    assignment.start_date.format("%Y-%m-%d").to_string(),
                    assignment.end_date.format("%Y-%m-%d").to_string(),
                ],
            )?;

            // 每阶段生成一个生产任务, 交期为阶段结束日
            let task_id = Uuid::new_v4().to_string();
            let span_days = assignment.span_days().max(1);
            tx.execute(
                r#"
                INSERT INTO production_task (
                    task_id, order_id, stage, department_code,
                    estimated_hours, due_date, status, completion_percent
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)
                "#,
                params![
                    task_id,
                    schedule.order_id,
                    assignment.stage.to_db_str(),
                    assignment.department_code,
                    span_days as f64 * HOURS_PER_SCHEDULED_DAY,
                    assignment.end_date.format("%Y-%m-%d").to_string(),
                    TaskStatus::Scheduled.to_db_str(),
                ],
            )?;

            // 日粒度占位: 后续排程调用据此派生负荷快照
            let mut day = assignment.start_date;
            while day <= assignment.end_date {
                tx.execute(
                    r#"
                    INSERT INTO task_assignment (task_id, department_code, work_date)
                    VALUES (?1, ?2, ?3)
                    "#,
                    params![
                        task_id,
                        assignment.department_code,
                        day.format("%Y-%m-%d").to_string(),
                    ],
                )?;
                day += Duration::days(1);
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(schedule_id)
    }

    // ==========================================
    // 任务查询与状态流转
    // ==========================================

    /// 按ID查询生产任务
    pub fn find_task(&self, task_id: &str) -> RepositoryResult<Option<ProductionTask>> {
        let conn = self.get_conn()?;
        let task = conn
            .query_row(
                r#"
                SELECT task_id, order_id, stage, department_code,
                       estimated_hours, due_date, status, completion_percent
                FROM production_task
                WHERE task_id = ?1
                "#,
                params![task_id],
                |row| {
                    let stage_str: String = row.get(2)?;
                    let due_str: String = row.get(5)?;
                    let status_str: String = row.get(6)?;
                    Ok(ProductionTask {
                        task_id: row.get(0)?,
                        order_id: row.get(1)?,
                        stage: Stage::from_str(&stage_str).unwrap_or(Stage::Engineering),
                        department_code: row.get(3)?,
                        estimated_hours: row.get(4)?,
                        due_date: NaiveDate::parse_from_str(&due_str, "%Y-%m-%d")
                            .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
                        status: TaskStatus::from_str(&status_str)
                            .unwrap_or(TaskStatus::Scheduled),
                        completion_percent: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(task)
    }

    /// 查询订单下的全部任务（按阶段顺序不保证，调用方按需排序）
    pub fn list_tasks_by_order(&self, order_id: &str) -> RepositoryResult<Vec<ProductionTask>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT task_id, order_id, stage, department_code,
                   estimated_hours, due_date, status, completion_percent
            FROM production_task
            WHERE order_id = ?1
            ORDER BY due_date ASC
            "#,
        )?;
        let rows = stmt.query_map(params![order_id], |row| {
            let stage_str: String = row.get(2)?;
            let due_str: String = row.get(5)?;
            let status_str: String = row.get(6)?;
            Ok(ProductionTask {
                task_id: row.get(0)?,
                order_id: row.get(1)?,
                stage: Stage::from_str(&stage_str).unwrap_or(Stage::Engineering),
                department_code: row.get(3)?,
                estimated_hours: row.get(4)?,
                due_date: NaiveDate::parse_from_str(&due_str, "%Y-%m-%d")
                    .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
                status: TaskStatus::from_str(&status_str).unwrap_or(TaskStatus::Scheduled),
                completion_percent: row.get(7)?,
            })
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// 更新任务状态与完成度
    ///
    /// 状态机校验由调用方（API 层）负责，仓储只做写入
    pub fn update_task_progress(
        &self,
        task_id: &str,
        status: TaskStatus,
        completion_percent: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE production_task
            SET status = ?2, completion_percent = ?3
            WHERE task_id = ?1
            "#,
            params![task_id, status.to_db_str(), completion_percent],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "production_task".to_string(),
                id: task_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 延期上报持久化
    // ==========================================

    /// 持久化延期上报
    pub fn save_delay_report(&self, report: &DelayReport) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO delay_report (
                report_id, task_id, completion_percent, reason,
                required_overtime_hours, impacts_deadline, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                report.report_id,
                report.task_id,
                report.reported_completion_percent,
                report.reason,
                report.required_overtime_hours,
                report.impacts_deadline,
                report.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
