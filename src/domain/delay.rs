// ==========================================
// 制造运营排程系统 - 延期与加班恢复领域模型
// ==========================================
// 职责: 延期上报事实与加班恢复计算结果
// 红线: 延期上报不回改历史记录；日期一律显式传入（无隐式"今天"）
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DelayReport - 延期上报
// ==========================================
// 生命周期: 任务负责人每次上报欠完成时创建一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayReport {
    pub report_id: String,                   // 上报ID
    pub task_id: String,                     // 任务ID
    pub reported_completion_percent: f64,    // 上报完成度 0-100
    pub reason: String,                      // 延期原因
    pub required_overtime_hours: f64,        // 需要加班小时数（>= 0）
    pub impacts_deadline: bool,              // 是否影响交期
    pub created_at: DateTime<Utc>,           // 上报时间（审计字段）
}

// ==========================================
// OvertimePolicy - 加班政策
// ==========================================
// overtime_efficiency < 1 表示疲劳折减
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvertimePolicy {
    pub regular_hours_per_day: f64,      // 正常工时/天
    pub max_overtime_hours_per_day: f64, // 加班上限/天
    pub overtime_efficiency: f64,        // 加班效率系数 (0,1]
}

impl Default for OvertimePolicy {
    fn default() -> Self {
        Self {
            regular_hours_per_day: 8.0,
            max_overtime_hours_per_day: 4.0,
            overtime_efficiency: 0.75,
        }
    }
}

// ==========================================
// OvertimeRecovery - 加班恢复计算结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvertimeRecovery {
    pub required_overtime_hours: f64,    // 需要加班小时数
    pub recoverable_days: i64,           // 可恢复天数
    pub new_completion_date: NaiveDate,  // 新完工日期
    pub impacts_deadline: bool,          // 是否影响交期
}
