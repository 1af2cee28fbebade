// ==========================================
// 制造运营排程系统 - 领域类型定义
// ==========================================
// 红线: 等级制,不是评分制
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 复杂度等级 (Complexity Tier)
// ==========================================
// 用途: 订单工艺复杂度档位，参与历史相似度匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplexityTier {
    Low,    // 简单
    Medium, // 常规
    High,   // 复杂
}

impl ComplexityTier {
    /// 等级序号 (用于邻近度计算)
    pub fn rank(&self) -> i32 {
        match self {
            ComplexityTier::Low => 0,
            ComplexityTier::Medium => 1,
            ComplexityTier::High => 2,
        }
    }

    /// 复杂度邻近度
    ///
    /// 固定邻近表: 相同档位 1.0，相邻档位 0.7，相隔档位 0.3
    pub fn proximity(&self, other: ComplexityTier) -> f64 {
        match (self.rank() - other.rank()).abs() {
            0 => 1.0,
            1 => 0.7,
            _ => 0.3,
        }
    }

    /// 从字符串解析复杂度
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LOW" => ComplexityTier::Low,
            "HIGH" => ComplexityTier::High,
            _ => ComplexityTier::Medium, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ComplexityTier::Low => "LOW",
            ComplexityTier::Medium => "MEDIUM",
            ComplexityTier::High => "HIGH",
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 优先等级 (Priority Tier)
// ==========================================
// 由订单交期与合同性质组合得出，影响排程提示（不参与相似度评分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    Low,    // 低
    Normal, // 正常
    High,   // 高
    Urgent, // 紧急
}

impl PriorityTier {
    /// 从字符串解析优先级
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LOW" => PriorityTier::Low,
            "HIGH" => PriorityTier::High,
            "URGENT" => PriorityTier::Urgent,
            _ => PriorityTier::Normal, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PriorityTier::Low => "LOW",
            PriorityTier::Normal => "NORMAL",
            PriorityTier::High => "HIGH",
            PriorityTier::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 置信等级 (Confidence Tier)
// ==========================================
// 顺序: Low < Medium < High
// 用途: 工期预估的可靠性标签，驱动聚合权重
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Low,    // 低
    Medium, // 中
    High,   // 高
}

impl ConfidenceTier {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::Medium => "MEDIUM",
            ConfidenceTier::High => "HIGH",
        }
    }

    /// 从字符串解析置信等级
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "HIGH" => ConfidenceTier::High,
            "MEDIUM" => ConfidenceTier::Medium,
            _ => ConfidenceTier::Low,
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 预估方法 (Estimate Method)
// ==========================================
// 红线: 所有预估结果必须输出 method（可解释性）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimateMethod {
    Similarity, // 历史相似订单加权
    Forecast,   // 时间序列预测
    Blended,    // 混合加权
    Default,    // 兜底默认值
}

impl EstimateMethod {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EstimateMethod::Similarity => "SIMILARITY",
            EstimateMethod::Forecast => "FORECAST",
            EstimateMethod::Blended => "BLENDED",
            EstimateMethod::Default => "DEFAULT",
        }
    }

    /// 从字符串解析预估方法
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SIMILARITY" => EstimateMethod::Similarity,
            "FORECAST" => EstimateMethod::Forecast,
            "BLENDED" => EstimateMethod::Blended,
            _ => EstimateMethod::Default,
        }
    }
}

impl fmt::Display for EstimateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 生产阶段 (Stage)
// ==========================================
// 每个订单顺序经过的四个固定阶段
// 阶段与部门一一对应（部门代码即产能配置主键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Engineering, // 工程设计
    Assembly,    // 装配
    Testing,     // 测试
    Packaging,   // 包装
}

impl Stage {
    /// 全部阶段（按工序顺序）
    pub const ALL: [Stage; 4] = [
        Stage::Engineering,
        Stage::Assembly,
        Stage::Testing,
        Stage::Packaging,
    ];

    /// 阶段工期占比（固定比例）
    pub fn ratio(&self) -> f64 {
        match self {
            Stage::Engineering => 0.25,
            Stage::Assembly => 0.40,
            Stage::Testing => 0.25,
            Stage::Packaging => 0.10,
        }
    }

    /// 阶段所属部门代码
    pub fn department_code(&self) -> &'static str {
        match self {
            Stage::Engineering => "ENG",
            Stage::Assembly => "ASM",
            Stage::Testing => "TST",
            Stage::Packaging => "PKG",
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Stage::Engineering => "ENGINEERING",
            Stage::Assembly => "ASSEMBLY",
            Stage::Testing => "TESTING",
            Stage::Packaging => "PACKAGING",
        }
    }

    /// 从字符串解析阶段
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ENGINEERING" => Some(Stage::Engineering),
            "ASSEMBLY" => Some(Stage::Assembly),
            "TESTING" => Some(Stage::Testing),
            "PACKAGING" => Some(Stage::Packaging),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 排程健康度 (Schedule Health)
// ==========================================
// OPTIMAL: 0 冲突; ACCEPTABLE: <3 冲突; CONGESTED: >=3 冲突
// UNKNOWN: 兜底排程（数据读取失败时的降级结果）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleHealth {
    Optimal,   // 无冲突
    Acceptable, // 少量冲突
    Congested, // 拥挤
    Unknown,   // 兜底
}

impl ScheduleHealth {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleHealth::Optimal => "OPTIMAL",
            ScheduleHealth::Acceptable => "ACCEPTABLE",
            ScheduleHealth::Congested => "CONGESTED",
            ScheduleHealth::Unknown => "UNKNOWN",
        }
    }

    /// 从字符串解析健康度
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "OPTIMAL" => ScheduleHealth::Optimal,
            "ACCEPTABLE" => ScheduleHealth::Acceptable,
            "CONGESTED" => ScheduleHealth::Congested,
            _ => ScheduleHealth::Unknown,
        }
    }
}

impl fmt::Display for ScheduleHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 任务状态 (Task Status)
// ==========================================
// 状态机: SCHEDULED → IN_PROGRESS → {COMPLETED | DELAYED}
//         DELAYED → IN_PROGRESS (恢复)
// 终态: COMPLETED, CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Scheduled,  // 已排程
    InProgress, // 进行中
    Completed,  // 已完成
    Delayed,    // 延期
    Cancelled,  // 已取消
}

impl TaskStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// 状态转换是否合法
    pub fn can_transition(&self, to: TaskStatus) -> bool {
        match (self, to) {
            (TaskStatus::Scheduled, TaskStatus::InProgress) => true,
            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::InProgress, TaskStatus::Delayed) => true,
            (TaskStatus::Delayed, TaskStatus::InProgress) => true,
            // 取消: 任意非终态 → CANCELLED
            (from, TaskStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TaskStatus::Scheduled => "SCHEDULED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Delayed => "DELAYED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// 从字符串解析任务状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SCHEDULED" => Some(TaskStatus::Scheduled),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            "DELAYED" => Some(TaskStatus::Delayed),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
