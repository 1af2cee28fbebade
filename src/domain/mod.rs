// ==========================================
// 制造运营排程系统 - 领域层
// ==========================================
// 职责: 领域实体与类型定义，不含数据访问
// ==========================================

pub mod delay;
pub mod estimate;
pub mod order;
pub mod replenishment;
pub mod schedule;
pub mod task;
pub mod types;

// 重导出领域实体
pub use delay::{DelayReport, OvertimePolicy, OvertimeRecovery};
pub use estimate::{DurationEstimate, SimilarityCandidate, StageDays};
pub use order::{CompletedOrderRecord, MaterialLine, OrderProfile};
pub use replenishment::ReplenishmentAdvice;
pub use schedule::{
    DepartmentCapacityProfile, DepartmentUtilization, ProductionSchedule, ScheduleSlot,
    StageAssignment,
};
pub use task::ProductionTask;
