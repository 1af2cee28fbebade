// ==========================================
// 制造运营排程系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎，不拼 SQL
// 红线: Engine 不拼 SQL, 所有结论必须可解释（method / reason / health）
// ==========================================

pub mod aggregator;
pub mod error;
pub mod forecaster;
pub mod overtime;
pub mod replenishment;
pub mod scheduler;
pub mod similarity;
pub mod training;

// 重导出核心引擎
pub use aggregator::{EstimateAggregator, EstimateInput};
pub use error::{EngineError, EngineResult};
pub use forecaster::{
    AutoRegressiveStrategy, ForecastStrategy, LastValuePredictor, SeasonalSmoothing,
    SequencePredictor, SimpleExponentialSmoothing, TimeSeriesForecaster,
};
pub use overtime::OvertimeRecoveryCalculator;
pub use replenishment::StockReplenishmentAdvisor;
pub use scheduler::CapacityScheduler;
pub use similarity::{HistoricalSimilarityEstimator, SimilarityEstimate};
pub use training::{TrainingCoordinator, TrainingGuard};
