// ==========================================
// 演示数据生成工具
// ==========================================
// 用途: 建表并生成一套可用于人工探索的演示数据
//       (历史完工订单 + 部门产能 + 已承诺负荷)
// 用法: cargo run --bin generate_test_data [db_path]
// ==========================================

use chrono::{Duration, NaiveDate};
use mfg_planning_engine::domain::order::{CompletedOrderRecord, MaterialLine, OrderProfile};
use mfg_planning_engine::domain::schedule::DepartmentCapacityProfile;
use mfg_planning_engine::domain::types::{ComplexityTier, PriorityTier, Stage};
use mfg_planning_engine::repository::{CapacityRepository, CompletedOrderRepository};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};

fn main() -> Result<(), Box<dyn Error>> {
    mfg_planning_engine::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mfg_planning_demo.db".to_string());
    tracing::info!("生成演示数据库: {}", db_path);

    let conn = mfg_planning_engine::db::open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    seed_capacities(&conn)?;
    seed_completed_orders(&conn)?;
    seed_committed_load(&conn)?;

    tracing::info!("演示数据生成完成");
    Ok(())
}

/// 初始化数据库 schema
fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        INSERT OR IGNORE INTO schema_version (version) VALUES (1);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS completed_order (
            order_id TEXT PRIMARY KEY,
            complexity TEXT NOT NULL,
            priority TEXT NOT NULL,
            technical_attribute_count INTEGER NOT NULL DEFAULT 0,
            material_lines TEXT NOT NULL,
            actual_duration_days INTEGER NOT NULL,
            per_stage_days TEXT NOT NULL,
            completed_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS department_capacity (
            department_code TEXT PRIMARY KEY,
            daily_slot_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_task (
            task_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL,
            stage TEXT NOT NULL,
            department_code TEXT NOT NULL,
            estimated_hours REAL NOT NULL,
            due_date TEXT NOT NULL,
            status TEXT NOT NULL,
            completion_percent REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS task_assignment (
            task_id TEXT NOT NULL,
            department_code TEXT NOT NULL,
            work_date TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_task_assignment_date
            ON task_assignment (work_date, department_code);

        CREATE TABLE IF NOT EXISTS duration_estimate (
            estimate_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL,
            total_days INTEGER NOT NULL,
            per_stage_days TEXT NOT NULL,
            confidence TEXT NOT NULL,
            method TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_schedule (
            schedule_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            conflict_count INTEGER NOT NULL,
            health TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_stage (
            schedule_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            stage TEXT NOT NULL,
            department_code TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            PRIMARY KEY (schedule_id, seq_no)
        );

        CREATE TABLE IF NOT EXISTS delay_report (
            report_id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL,
            completion_percent REAL NOT NULL,
            reason TEXT NOT NULL,
            required_overtime_hours REAL NOT NULL,
            impacts_deadline INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// 部门产能: 四个固定部门
fn seed_capacities(conn: &Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let repo = CapacityRepository::from_connection(Arc::clone(conn));
    for (code, slots) in [("ENG", 3), ("ASM", 4), ("TST", 2), ("PKG", 2)] {
        repo.upsert_department_capacity(&DepartmentCapacityProfile {
            department_code: code.to_string(),
            daily_slot_count: slots,
        })?;
    }
    tracing::info!("部门产能配置: 4 条");
    Ok(())
}

/// 历史完工订单: 覆盖三档复杂度与多种物料组合
fn seed_completed_orders(conn: &Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let repo = CompletedOrderRepository::from_connection(Arc::clone(conn));
    let base_date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    // (复杂度, 物料组合, 实际工期)
    let templates: [(ComplexityTier, &[(&str, f64)], i64); 6] = [
        (ComplexityTier::Low, &[("STEEL", 5.0), ("FASTENER", 20.0)], 9),
        (ComplexityTier::Low, &[("ALUMINUM", 8.0), ("FASTENER", 12.0)], 11),
        (ComplexityTier::Medium, &[("STEEL", 12.0), ("COPPER", 3.0), ("FASTENER", 30.0)], 16),
        (ComplexityTier::Medium, &[("STEEL", 10.0), ("ELECTRONICS", 4.0)], 18),
        (ComplexityTier::High, &[("STEEL", 20.0), ("ELECTRONICS", 9.0), ("COPPER", 6.0)], 27),
        (ComplexityTier::High, &[("ALUMINUM", 15.0), ("ELECTRONICS", 12.0)], 31),
    ];

    let mut count = 0;
    for round in 0..4_i64 {
        for (idx, (complexity, lines, base_days)) in templates.iter().enumerate() {
            // 工期按轮次微调，形成可预测的日序列
            let duration = base_days + round % 3;
            let completed = base_date + Duration::days(round * 7 + idx as i64);
            let record = CompletedOrderRecord {
                order_id: format!("ORD-H{}{:02}", round, idx),
                profile: OrderProfile {
                    complexity_tier: *complexity,
                    priority_tier: PriorityTier::Normal,
                    material_lines: lines
                        .iter()
                        .map(|(tag, qty)| MaterialLine::new(tag, *qty))
                        .collect(),
                    technical_attribute_count: 2 + idx as u32,
                },
                actual_duration_days: duration,
                per_stage_durations: split_demo_stages(duration),
                completed_date: completed,
            };
            repo.insert(&record)?;
            count += 1;
        }
    }
    tracing::info!("历史完工订单: {} 条", count);
    Ok(())
}

/// 演示用阶段拆分（与引擎固定比例一致，尾差归入包装）
fn split_demo_stages(total: i64) -> Vec<(Stage, i64)> {
    let eng = ((total as f64 * 0.25).floor() as i64).max(1);
    let asm = ((total as f64 * 0.40).floor() as i64).max(1);
    let tst = ((total as f64 * 0.25).floor() as i64).max(1);
    let pkg = (total - eng - asm - tst).max(1);
    vec![
        (Stage::Engineering, eng),
        (Stage::Assembly, asm),
        (Stage::Testing, tst),
        (Stage::Packaging, pkg),
    ]
}

/// 已承诺负荷: 近期若干在制任务的日粒度占位
fn seed_committed_load(conn: &Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
    let start = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();

    // (任务, 部门, 起始偏移, 天数)
    let commitments = [
        ("TASK-W001", "ENG", 0_i64, 3_i64),
        ("TASK-W002", "ENG", 1, 4),
        ("TASK-W003", "ASM", 2, 5),
        ("TASK-W004", "ASM", 4, 6),
        ("TASK-W005", "TST", 6, 3),
        ("TASK-W006", "PKG", 9, 2),
    ];

    for &(task_id, dept, offset, days) in &commitments {
        let first = start + Duration::days(offset);
        let last = first + Duration::days(days - 1);
        guard.execute(
            r#"
            INSERT OR REPLACE INTO production_task (
                task_id, order_id, stage, department_code,
                estimated_hours, due_date, status, completion_percent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'IN_PROGRESS', 40)
            "#,
            rusqlite::params![
                task_id,
                format!("ORD-W{}", &task_id[6..]),
                stage_for(dept),
                dept,
                days as f64 * 8.0,
                last.format("%Y-%m-%d").to_string(),
            ],
        )?;

        let mut day = first;
        while day <= last {
            guard.execute(
                "INSERT INTO task_assignment (task_id, department_code, work_date) VALUES (?1, ?2, ?3)",
                rusqlite::params![task_id, dept, day.format("%Y-%m-%d").to_string()],
            )?;
            day += Duration::days(1);
        }
    }
    tracing::info!("已承诺负荷: {} 个任务", commitments.len());
    Ok(())
}

fn stage_for(dept: &str) -> &'static str {
    match dept {
        "ENG" => "ENGINEERING",
        "ASM" => "ASSEMBLY",
        "TST" => "TESTING",
        _ => "PACKAGING",
    }
}
