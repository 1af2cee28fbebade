// ==========================================
// 制造运营排程系统 - 历史相似度预估引擎
// ==========================================
// 职责: 按物料构成与复杂度对历史完工订单打分，
//       对通过阈值的候选做相似度加权工期平均
// 输入: 新订单画像 + 历史完工订单列表（只读）
// 输出: 候选列表 + 加权工期 + 置信等级
// 红线: 纯函数，不产生副作用；评分为 0 的记录不进入加权平均
// ==========================================

use crate::config::SimilarityParams;
use crate::domain::estimate::SimilarityCandidate;
use crate::domain::order::{CompletedOrderRecord, OrderProfile};
use crate::domain::types::ConfidenceTier;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

// ==========================================
// SimilarityEstimate - 相似度预估结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SimilarityEstimate {
    pub candidates: Vec<SimilarityCandidate>, // 通过阈值的候选（按相似度降序，top-k）
    pub weighted_days: f64,                   // 相似度加权工期（无候选时为 0）
    pub confidence: ConfidenceTier,           // 置信等级
}

impl SimilarityEstimate {
    /// 无候选时的降级结果（调用方回落到预测/默认值）
    pub fn low_confidence() -> Self {
        Self {
            candidates: Vec::new(),
            weighted_days: 0.0,
            confidence: ConfidenceTier::Low,
        }
    }
}

// ==========================================
// HistoricalSimilarityEstimator - 历史相似度预估引擎
// ==========================================
pub struct HistoricalSimilarityEstimator {
    params: SimilarityParams,
}

impl HistoricalSimilarityEstimator {
    /// 构造函数
    pub fn new(params: SimilarityParams) -> Self {
        Self { params }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对历史完工订单打分并产出加权工期预估
    ///
    /// 规则:
    /// 1) 逐条记录计算综合相似度 = 类别重合度×w_cat + 复杂度邻近度×w_cpx
    /// 2) 保留 score > min_score 的记录，按相似度降序取 top_k
    /// 3) 加权平均 actual_duration_days（权重归一化）
    /// 4) 置信: >=3 候选且最高分 > 0.7 → HIGH;
    ///          >=2 候选且最高分 > 0.5 → MEDIUM; 否则 LOW
    ///
    /// # 参数
    /// - `profile`: 新订单画像
    /// - `history`: 历史完工订单（只读）
    ///
    /// # 返回
    /// SimilarityEstimate（无候选时 confidence=LOW，candidates 为空）
    #[instrument(skip(self, profile, history), fields(
        history_count = history.len(),
        complexity = %profile.complexity_tier
    ))]
    pub fn estimate(
        &self,
        profile: &OrderProfile,
        history: &[CompletedOrderRecord],
    ) -> SimilarityEstimate {
        if history.is_empty() {
            return SimilarityEstimate::low_confidence();
        }

        let quantities = profile.category_quantities();

        // 逐条打分（记录之间无共享可变状态，规模大时并行扇出）
        let score_one = |record: &CompletedOrderRecord| -> (String, f64, i64) {
            let score = self.score_against(&quantities, profile, record);
            (record.order_id.clone(), score, record.actual_duration_days)
        };

        let mut scored: Vec<(String, f64, i64)> =
            if history.len() >= self.params.parallel_threshold {
                history.par_iter().map(score_one).collect()
            } else {
                history.iter().map(score_one).collect()
            };

        // 阈值过滤 + 降序排序 + top-k
        scored.retain(|(_, score, _)| *score > self.params.min_score);
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.params.top_k);

        if scored.is_empty() {
            return SimilarityEstimate::low_confidence();
        }

        let candidates: Vec<SimilarityCandidate> = scored
            .iter()
            .map(|(id, score, days)| SimilarityCandidate {
                record_id: id.clone(),
                score: *score,
                actual_duration_days: *days,
            })
            .collect();

        // 相似度加权平均（权重归一化到和为 1）
        let weight_sum: f64 = candidates.iter().map(|c| c.score).sum();
        let weighted_days: f64 = candidates
            .iter()
            .map(|c| c.score * c.actual_duration_days as f64)
            .sum::<f64>()
            / weight_sum;

        let top_score = candidates[0].score;
        let confidence = if candidates.len() >= 3 && top_score > 0.7 {
            ConfidenceTier::High
        } else if candidates.len() >= 2 && top_score > 0.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        };

        SimilarityEstimate {
            candidates,
            weighted_days,
            confidence,
        }
    }

    /// 两个订单画像之间的综合相似度（对称，范围 [0,1]）
    pub fn score_profiles(&self, a: &OrderProfile, b: &OrderProfile) -> f64 {
        let category = Self::category_similarity(&a.category_quantities(), &b.category_quantities());
        let complexity = a.complexity_tier.proximity(b.complexity_tier);
        self.params.category_weight * category + self.params.complexity_weight * complexity
    }

    // ==========================================
    // 评分细节
    // ==========================================

    /// 新订单（已聚合数量）对单条历史记录的综合相似度
    fn score_against(
        &self,
        profile_quantities: &HashMap<String, f64>,
        profile: &OrderProfile,
        record: &CompletedOrderRecord,
    ) -> f64 {
        let record_quantities = record.profile.category_quantities();
        let category = Self::category_similarity(profile_quantities, &record_quantities);
        let complexity = profile
            .complexity_tier
            .proximity(record.profile.complexity_tier);
        self.params.category_weight * category + self.params.complexity_weight * complexity
    }

    /// 类别重合度
    ///
    /// 口径: 对双方出现过的类别并集求均值；
    ///       双方都有的类别贡献 min(qtyA,qtyB)/max(qtyA,qtyB)，
    ///       仅一方出现的类别贡献 0（但计入并集分母）
    fn category_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
        let union: HashSet<&String> = a.keys().chain(b.keys()).collect();
        if union.is_empty() {
            // 双方都无物料行: 无类别证据
            return 0.0;
        }

        let mut total = 0.0;
        for tag in &union {
            match (a.get(*tag), b.get(*tag)) {
                (Some(&qa), Some(&qb)) => {
                    let max_q = qa.max(qb);
                    // 双方数量均为 0 视为完全一致
                    total += if max_q <= 0.0 { 1.0 } else { qa.min(qb) / max_q };
                }
                _ => {} // 仅一方出现: 贡献 0
            }
        }
        total / union.len() as f64
    }
}
