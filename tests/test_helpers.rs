// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;

    // 初始化 schema
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 初始化数据库 schema
pub fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
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
