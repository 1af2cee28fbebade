// ==========================================
// 制造运营排程系统 - 生产任务领域模型
// ==========================================
// 用途: 延期上报与已承诺负荷的任务侧事实
// 状态机见 types::TaskStatus
// ==========================================

use crate::domain::types::{Stage, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionTask - 生产任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTask {
    pub task_id: String,            // 任务ID
    pub order_id: String,           // 所属订单
    pub stage: Stage,               // 所属阶段
    pub department_code: String,    // 承担部门
    pub estimated_hours: f64,       // 预估工时
    pub due_date: NaiveDate,        // 交期（阶段结束日）
    pub status: TaskStatus,         // 任务状态
    pub completion_percent: f64,    // 最近上报完成度 0-100
}
