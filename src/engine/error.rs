// ==========================================
// 制造运营排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播策略: 只有 InvalidProfile 与 TrainingInProgress 上抛给调用方，
//           其余错误在聚合链内就地降级为低置信结果
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 数据量不足 =====
    #[error("历史数据不足: 可用={available}, 需要={required}")]
    InsufficientHistory { available: usize, required: usize },

    // ===== 并发控制错误 =====
    #[error("训练已在进行中，拒绝并发训练请求")]
    TrainingInProgress,

    // ===== 排程错误 =====
    #[error("扫描窗口内无零冲突起始日: window_days={window_days}")]
    NoFeasibleSlot { window_days: i64 },

    // ===== 输入校验错误 =====
    #[error("订单画像非法: {0}")]
    InvalidProfile(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
