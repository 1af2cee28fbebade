// ==========================================
// 制造运营排程系统 - 预估聚合引擎
// ==========================================
// 职责: 将相似度预估与预测预估合并为唯一工期结论
// 规则: 按序应用兜底/高置信直通/低置信让位/加权混合
// 红线: 调用方永远拿到一个结论；最差情况回落到配置的默认工期
// ==========================================

use crate::config::AggregateParams;
use crate::domain::estimate::{DurationEstimate, StageDays};
use crate::domain::types::{ConfidenceTier, EstimateMethod, Stage};
use tracing::debug;

// ==========================================
// EstimateInput - 聚合输入
// ==========================================
// 单一来源的点预估（相似度来源或预测来源）
#[derive(Debug, Clone, Copy)]
pub struct EstimateInput {
    pub days: f64,                  // 工期点预估（天）
    pub confidence: ConfidenceTier, // 来源置信
}

// ==========================================
// EstimateAggregator - 预估聚合引擎
// ==========================================
pub struct EstimateAggregator {
    params: AggregateParams,
}

impl EstimateAggregator {
    /// 构造函数
    pub fn new(params: AggregateParams) -> Self {
        Self { params }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 合并两路预估
    ///
    /// 规则（按序）:
    /// 1) 双缺失 → 配置默认工期, method=DEFAULT, 置信 LOW
    /// 2) 单路存在 → 原样采用该路（置信不变）
    /// 3) 相似置信 HIGH → 直通相似结果
    /// 4) 相似置信 LOW 且预测存在 → 采用预测
    /// 5) 其余混合: 相似权重 = 置信 MEDIUM 时 0.7, 否则 0.3;
    ///    combined = ceil(sim×w + forecast×(1-w));
    ///    置信 = 两路最高置信 >= MEDIUM 时 MEDIUM, 否则 LOW
    pub fn combine(
        &self,
        similarity: Option<EstimateInput>,
        forecast: Option<EstimateInput>,
    ) -> DurationEstimate {
        match (similarity, forecast) {
            (None, None) => {
                debug!("两路预估均缺失，采用默认工期");
                self.build(
                    self.params.default_total_days,
                    ConfidenceTier::Low,
                    EstimateMethod::Default,
                )
            }
            (Some(sim), None) => self.build(
                Self::round_days(sim.days),
                sim.confidence,
                EstimateMethod::Similarity,
            ),
            (None, Some(fc)) => self.build(
                Self::round_days(fc.days),
                fc.confidence,
                EstimateMethod::Forecast,
            ),
            (Some(sim), Some(fc)) => {
                if sim.confidence == ConfidenceTier::High {
                    return self.build(
                        Self::round_days(sim.days),
                        ConfidenceTier::High,
                        EstimateMethod::Similarity,
                    );
                }
                if sim.confidence == ConfidenceTier::Low {
                    return self.build(
                        Self::round_days(fc.days),
                        fc.confidence,
                        EstimateMethod::Forecast,
                    );
                }

                // 混合加权
                let w_sim = if sim.confidence == ConfidenceTier::Medium {
                    self.params.medium_similarity_weight
                } else {
                    self.params.low_similarity_weight
                };
                let combined = (sim.days * w_sim + fc.days * (1.0 - w_sim)).ceil() as i64;
                let confidence = if sim.confidence.max(fc.confidence) >= ConfidenceTier::Medium {
                    ConfidenceTier::Medium
                } else {
                    ConfidenceTier::Low
                };
                self.build(combined, confidence, EstimateMethod::Blended)
            }
        }
    }

    /// 按固定阶段比例拆分总工期
    ///
    /// 规则: 非末段取 floor(total×ratio) 且至少 1 天，尾差归入最后阶段；
    ///       每阶段至少 1 天 ⇒ 总工期下限为阶段数
    pub fn split_stages(total_days: i64) -> Vec<StageDays> {
        let total = total_days.max(Stage::ALL.len() as i64);
        let mut result = Vec::with_capacity(Stage::ALL.len());
        let mut allocated: i64 = 0;

        for (idx, stage) in Stage::ALL.iter().enumerate() {
            let days = if idx == Stage::ALL.len() - 1 {
                total - allocated // 尾差归入最后阶段
            } else {
                ((total as f64 * stage.ratio()).floor() as i64).max(1)
            };
            allocated += days;
            result.push(StageDays { stage: *stage, days });
        }
        result
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 点预估取整为天数（向上取整，至少 1 天）
    fn round_days(days: f64) -> i64 {
        (days.ceil() as i64).max(1)
    }

    /// 构造最终工期预估（阶段拆分始终由合并总工期重新推导）
    fn build(
        &self,
        total_days: i64,
        confidence: ConfidenceTier,
        method: EstimateMethod,
    ) -> DurationEstimate {
        let per_stage_days = Self::split_stages(total_days);
        let total: i64 = per_stage_days.iter().map(|s| s.days).sum();
        DurationEstimate {
            total_days: total,
            per_stage_days,
            confidence,
            method,
        }
    }
}
