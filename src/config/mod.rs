// ==========================================
// 制造运营排程系统 - 配置层
// ==========================================
// 职责: 引擎参数管理，支持 config_kv 覆写
// 红线: 常量是默认值，不是唯一真值（一律经配置暴露）
// ==========================================

pub mod engine_params;

// 重导出参数类型
pub use engine_params::{
    AggregateParams, EngineParams, ForecastParams, ReplenishmentParams, ScheduleParams,
    SimilarityParams, ENGINE_PARAMS_KEY,
};
