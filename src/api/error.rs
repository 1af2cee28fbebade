// ==========================================
// 制造运营排程系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为用户可读的错误消息
// 红线: 可解释性——所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("训练已在进行中，拒绝并发训练请求")]
    TrainingInProgress,

    // ==========================================
    // 数据量不足
    // ==========================================
    #[error("历史数据不足: 可用={available}, 需要={required}")]
    InsufficientHistory { available: usize, required: usize },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

// 仓储错误 → API错误
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::ValidationError(msg) | RepositoryError::FieldValueError { message: msg, .. } => {
                ApiError::InvalidInput(msg)
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

// 引擎错误 → API错误
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidProfile(msg) => ApiError::InvalidInput(msg),
            EngineError::TrainingInProgress => ApiError::TrainingInProgress,
            EngineError::InsufficientHistory { available, required } => {
                ApiError::InsufficientHistory { available, required }
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
