// ==========================================
// 制造运营排程系统 - API 层
// ==========================================
// 职责: 面向外部调用方（订单创建/任务更新/对话报表层）的业务接口
// ==========================================

pub mod error;
pub mod planning_api;

// 重导出
pub use error::{ApiError, ApiResult};
pub use planning_api::PlanningApi;
