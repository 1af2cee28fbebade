// ==========================================
// 制造运营排程系统 - 排程领域模型
// ==========================================
// 红线: 产能约束优先于任务优先级
// 用途: 部门产能配置、已承诺负荷快照、排程结果
// ==========================================

use crate::domain::types::{ScheduleHealth, Stage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DepartmentCapacityProfile - 部门产能配置
// ==========================================
// 静态配置，不从数据推导
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentCapacityProfile {
    pub department_code: String, // 部门代码
    pub daily_slot_count: i64,   // 每日槽位数（>= 1）
}

// ==========================================
// ScheduleSlot - 日负荷快照
// ==========================================
// 由已承诺任务在排程计算时刻派生; 每次调用重算，不跨调用缓存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub department_code: String, // 部门代码
    pub date: NaiveDate,         // 日期
    pub occupied_count: i64,     // 已占用槽位数（>= 0）
}

// ==========================================
// StageAssignment - 阶段排期
// ==========================================
// 不变量: stage[i+1].start_date > stage[i].end_date（阶段顺序，无重叠）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAssignment {
    pub stage: Stage,            // 阶段
    pub department_code: String, // 承担部门
    pub start_date: NaiveDate,   // 开始日期（含）
    pub end_date: NaiveDate,     // 结束日期（含）
}

impl StageAssignment {
    /// 占用天数（日历天，含首尾）
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

// ==========================================
// DepartmentUtilization - 部门利用率
// ==========================================
// 口径: 窗口内占用槽位数 / (每日槽位数 × 窗口内工作日数)
// 不截断: 超过 1.0 表示超额承诺，供驾驶舱展示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentUtilization {
    pub department_code: String, // 部门代码
    pub occupied_slots: i64,     // 窗口内占用槽位数
    pub utilization: f64,        // 利用率
}

// ==========================================
// ProductionSchedule - 生产排程
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSchedule {
    pub order_id: String,                              // 订单ID
    pub start_date: NaiveDate,                         // 总开始日期
    pub end_date: NaiveDate,                           // 总结束日期
    pub stages: Vec<StageAssignment>,                  // 阶段排期（工序顺序）
    pub conflict_count: i64,                           // 选中起始日的冲突天数
    pub health: ScheduleHealth,                        // 健康度标签
    pub department_utilization: Vec<DepartmentUtilization>, // 窗口内部门利用率
}

impl ProductionSchedule {
    /// 校验阶段顺序（后一阶段必须在前一阶段结束之后开始）
    pub fn stages_sequential(&self) -> bool {
        self.stages
            .windows(2)
            .all(|w| w[1].start_date > w[0].end_date)
    }
}
