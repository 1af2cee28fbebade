// ==========================================
// 制造运营排程系统 - 排程业务接口
// ==========================================
// 职责: 面向订单创建/任务更新/对话报表层的业务门面
// 降级策略:
// - estimate_duration 永不硬失败（画像校验除外），
//   读取失败逐级回落，终止于配置的默认工期
// - build_schedule 数据不可用时回落为 UNKNOWN 健康度的兜底排程
// - 只有 InvalidInput / NotFound / TrainingInProgress /
//   InsufficientHistory 作为显式错误上抛
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineParams;
use crate::db::open_sqlite_connection;
use crate::domain::delay::{DelayReport, OvertimeRecovery};
use crate::domain::estimate::DurationEstimate;
use crate::domain::order::{CompletedOrderRecord, OrderProfile};
use crate::domain::replenishment::ReplenishmentAdvice;
use crate::domain::schedule::ProductionSchedule;
use crate::domain::types::{ConfidenceTier, TaskStatus};
use crate::engine::aggregator::{EstimateAggregator, EstimateInput};
use crate::engine::overtime::OvertimeRecoveryCalculator;
use crate::engine::replenishment::StockReplenishmentAdvisor;
use crate::engine::scheduler::CapacityScheduler;
use crate::engine::similarity::HistoricalSimilarityEstimator;
use crate::engine::training::TrainingCoordinator;
use crate::engine::TimeSeriesForecaster;
use crate::repository::{CapacityRepository, CompletedOrderRepository, PlanRepository};
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PlanningApi - 排程业务门面
// ==========================================
pub struct PlanningApi {
    completed_order_repo: Arc<CompletedOrderRepository>,
    capacity_repo: Arc<CapacityRepository>,
    plan_repo: Arc<PlanRepository>,
    params: EngineParams,
    training: Arc<TrainingCoordinator>,
}

impl PlanningApi {
    /// 从数据库路径创建业务门面
    ///
    /// 各仓储共享同一条已统一 PRAGMA 的连接；
    /// 引擎参数从 config_kv 覆写加载（缺失时取默认值）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let params = EngineParams::load(&conn)
            .map_err(|e| ApiError::InternalError(format!("引擎参数加载失败: {}", e)))?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self::from_connection(conn, params))
    }

    /// 从已有连接创建业务门面
    pub fn from_connection(conn: Arc<Mutex<Connection>>, params: EngineParams) -> Self {
        Self {
            completed_order_repo: Arc::new(CompletedOrderRepository::from_connection(
                Arc::clone(&conn),
            )),
            capacity_repo: Arc::new(CapacityRepository::from_connection(Arc::clone(&conn))),
            plan_repo: Arc::new(PlanRepository::from_connection(conn)),
            params,
            training: Arc::new(TrainingCoordinator::new()),
        }
    }

    /// 当前引擎参数（只读）
    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    // ==========================================
    // 工期预估
    // ==========================================

    /// 预估新订单工期
    ///
    /// 流程: 相似度预估与预测预估独立产出 → 聚合为唯一结论。
    /// 仓储读取失败降级为空历史（低置信），不上抛
    ///
    /// # 错误
    /// - InvalidInput: 订单画像非法（负数量等），快速失败
    #[instrument(skip(self, profile), fields(complexity = %profile.complexity_tier))]
    pub async fn estimate_duration(&self, profile: &OrderProfile) -> ApiResult<DurationEstimate> {
        profile
            .validate()
            .map_err(ApiError::InvalidInput)?;

        let history = match self.completed_order_repo.list_completed_orders(None) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "历史完工订单读取失败，降级为空历史");
                Vec::new()
            }
        };

        // 两路独立预估
        let similarity_input = self.similarity_input(profile, &history);
        let forecast_input = self.forecast_input(&history);

        let aggregator = EstimateAggregator::new(self.params.aggregate.clone());
        let estimate = aggregator.combine(similarity_input, forecast_input);

        info!(
            total_days = estimate.total_days,
            confidence = %estimate.confidence,
            method = %estimate.method,
            history_count = history.len(),
            "工期预估完成"
        );
        Ok(estimate)
    }

    /// 相似度路预估输入
    fn similarity_input(
        &self,
        profile: &OrderProfile,
        history: &[CompletedOrderRecord],
    ) -> Option<EstimateInput> {
        let estimator = HistoricalSimilarityEstimator::new(self.params.similarity.clone());
        let result = estimator.estimate(profile, history);
        if result.candidates.is_empty() {
            return None;
        }
        Some(EstimateInput {
            days: result.weighted_days,
            confidence: result.confidence,
        })
    }

    /// 预测路预估输入
    ///
    /// 口径: 按完工日期聚合的日均实际工期序列 → 指数平滑一步预测。
    /// 序列不足两点时本路缺失；历史条数达到 min_history 时置信为中
    fn forecast_input(&self, history: &[CompletedOrderRecord]) -> Option<EstimateInput> {
        let series = Self::duration_series(history);
        if series.len() < 2 {
            return None;
        }

        let forecaster = TimeSeriesForecaster::new(self.params.forecast.clone());
        let strategy = forecaster.simple_smoothing();
        let forecast = forecaster.forecast(&series, 1, &strategy);
        let days = forecast.first().copied().unwrap_or(0.0);
        if days <= 0.0 {
            return None;
        }

        let confidence = if history.len() >= self.params.forecast.min_history {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };
        Some(EstimateInput { days, confidence })
    }

    /// 按完工日期聚合的日均实际工期序列（升序）
    fn duration_series(history: &[CompletedOrderRecord]) -> Vec<f64> {
        let mut by_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for record in history {
            let entry = by_day.entry(record.completed_date).or_insert((0.0, 0));
            entry.0 += record.actual_duration_days as f64;
            entry.1 += 1;
        }
        by_day
            .into_values()
            .map(|(sum, count)| sum / count as f64)
            .collect()
    }

    // ==========================================
    // 产能排程
    // ==========================================

    /// 为订单构建产能约束下的生产排程并持久化
    ///
    /// 已承诺负荷在每次调用时重新取快照；数据读取失败时
    /// 回落为自 as_of 起的 UNKNOWN 兜底排程
    ///
    /// # 参数
    /// - earliest_start: 最早开始日（None 时取 as_of）
    /// - as_of: 调用基准日（显式传入，不读系统时钟）
    #[instrument(skip(self, estimate), fields(order_id = %order_id, total_days = estimate.total_days))]
    pub async fn build_schedule(
        &self,
        order_id: &str,
        estimate: &DurationEstimate,
        earliest_start: Option<NaiveDate>,
        as_of: NaiveDate,
    ) -> ApiResult<ProductionSchedule> {
        let start = earliest_start.unwrap_or(as_of);
        let scheduler = CapacityScheduler::new(self.params.schedule.clone());

        // 快照范围: 扫描窗口 + 最长落位跨度
        let snapshot_end =
            start + Duration::days(self.params.schedule.scan_window_days + estimate.total_days);

        let capacities = self.capacity_repo.list_department_capacities();
        let committed = self.capacity_repo.list_committed_slots(start, snapshot_end, None);

        let schedule = match (capacities, committed) {
            (Ok(capacities), Ok(committed)) => {
                scheduler.schedule(order_id, estimate, &capacities, &committed, start)
            }
            (capacities, committed) => {
                if let Err(e) = &capacities {
                    warn!(error = %e, "部门产能读取失败，回落为兜底排程");
                }
                if let Err(e) = &committed {
                    warn!(error = %e, "已承诺负荷读取失败，回落为兜底排程");
                }
                scheduler.fallback_schedule(order_id, estimate, as_of)
            }
        };

        // 持久化失败不阻断结论返回（降级为仅内存结果）
        if let Err(e) = self.plan_repo.save_estimate(order_id, estimate) {
            warn!(error = %e, order_id, "工期预估持久化失败");
        }
        match self.plan_repo.save_schedule(&schedule) {
            Ok(schedule_id) => {
                info!(
                    schedule_id = %schedule_id,
                    start_date = %schedule.start_date,
                    health = %schedule.health,
                    conflicts = schedule.conflict_count,
                    "生产排程已落库"
                );
            }
            Err(e) => warn!(error = %e, order_id, "生产排程持久化失败"),
        }

        Ok(schedule)
    }

    // ==========================================
    // 延期上报
    // ==========================================

    /// 上报任务延期并计算加班恢复方案
    ///
    /// 副作用: 持久化 DelayReport；任务状态按状态机流转为 DELAYED
    /// （通知派发由外部协作方完成）
    ///
    /// # 错误
    /// - NotFound: 任务不存在
    /// - InvalidInput: 完成度越界
    #[instrument(skip(self, reason), fields(task_id = %task_id))]
    pub async fn report_delay(
        &self,
        task_id: &str,
        completion_percent: f64,
        reason: &str,
        as_of: NaiveDate,
    ) -> ApiResult<(DelayReport, OvertimeRecovery)> {
        let task = self
            .plan_repo
            .find_task(task_id)?
            .ok_or_else(|| ApiError::NotFound(format!("production_task (id={})", task_id)))?;

        let calculator = OvertimeRecoveryCalculator::new();
        let recovery = calculator.recover(
            task.estimated_hours,
            completion_percent,
            task.due_date,
            as_of,
            &self.params.overtime,
        )?;

        let report = DelayReport {
            report_id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            reported_completion_percent: completion_percent,
            reason: reason.to_string(),
            required_overtime_hours: recovery.required_overtime_hours,
            impacts_deadline: recovery.impacts_deadline,
            created_at: Utc::now(),
        };

        if let Err(e) = self.plan_repo.save_delay_report(&report) {
            warn!(error = %e, task_id, "延期上报持久化失败");
        }

        // 状态机流转: 终态任务只告警，不阻断计算结论
        // 未开工任务的延期上报视同已开工 (SCHEDULED → IN_PROGRESS → DELAYED)
        let can_delay = task.status.can_transition(TaskStatus::Delayed)
            || task.status == TaskStatus::Scheduled
            || task.status == TaskStatus::Delayed;
        if can_delay {
            if let Err(e) =
                self.plan_repo
                    .update_task_progress(task_id, TaskStatus::Delayed, completion_percent)
            {
                warn!(error = %e, task_id, "任务状态更新失败");
            }
        } else {
            warn!(
                task_id,
                from = %task.status,
                "任务状态不允许流转为 DELAYED，跳过状态更新"
            );
        }

        info!(
            required_overtime_hours = recovery.required_overtime_hours,
            impacts_deadline = recovery.impacts_deadline,
            "延期上报已受理"
        );
        Ok((report, recovery))
    }

    // ==========================================
    // 补货建议
    // ==========================================

    /// 基于需求序列产出补货建议（纯计算，无副作用）
    #[instrument(skip(self, demand_series), fields(material_id = %material_id, series_len = demand_series.len()))]
    pub async fn recommend_replenishment(
        &self,
        material_id: &str,
        demand_series: &[f64],
    ) -> ApiResult<ReplenishmentAdvice> {
        if demand_series.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ApiError::InvalidInput("需求序列含非法值".to_string()));
        }
        let advisor = StockReplenishmentAdvisor::new(
            self.params.replenishment.clone(),
            self.params.forecast.clone(),
        );
        Ok(advisor.recommend(material_id, demand_series))
    }

    // ==========================================
    // 序列模型训练
    // ==========================================

    /// 触发序列模型训练（进程级互斥）
    ///
    /// # 错误
    /// - TrainingInProgress: 已有训练在进行，立即拒绝
    /// - InsufficientHistory: 完工订单数不足训练门槛
    #[instrument(skip(self), fields(as_of = %as_of))]
    pub async fn train_sequence_model(&self, as_of: NaiveDate) -> ApiResult<()> {
        let guard = self.training.begin().map_err(ApiError::from)?;

        let available = self.completed_order_repo.count()?;
        let required = self.params.forecast.min_history;
        if available < required {
            // guard drop 让出训练权
            return Err(ApiError::InsufficientHistory {
                available,
                required,
            });
        }

        // 统计策略不需要拟合; 学习型序列模型经 SequencePredictor 接口接入后
        // 在此执行批量训练
        info!(history_count = available, "序列模型训练占位执行");
        guard.finish(as_of);
        Ok(())
    }

    /// 训练协调器（供并发调用方共享）
    pub fn training_coordinator(&self) -> Arc<TrainingCoordinator> {
        Arc::clone(&self.training)
    }
}
