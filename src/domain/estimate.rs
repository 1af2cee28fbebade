// ==========================================
// 制造运营排程系统 - 工期预估领域模型
// ==========================================
// 职责: 相似候选与最终工期预估结果
// 红线: sum(per_stage_days) == total_days（尾差归入最后阶段）
// ==========================================

use crate::domain::types::{ConfidenceTier, EstimateMethod, Stage};
use serde::{Deserialize, Serialize};

// ==========================================
// SimilarityCandidate - 相似候选
// ==========================================
// 不变量: score ∈ [0,1]; score == 0 的记录不进入加权平均
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityCandidate {
    pub record_id: String,          // 历史订单ID
    pub score: f64,                 // 相似度 [0,1]
    pub actual_duration_days: i64,  // 该历史订单实际工期
}

// ==========================================
// StageDays - 阶段工期
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDays {
    pub stage: Stage, // 阶段
    pub days: i64,    // 工期（天，>= 1）
}

// ==========================================
// DurationEstimate - 工期预估
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub total_days: i64,              // 总工期（天，>= 1）
    pub per_stage_days: Vec<StageDays>, // 各阶段工期（按工序顺序）
    pub confidence: ConfidenceTier,   // 置信等级
    pub method: EstimateMethod,       // 预估方法（可解释性）
}

impl DurationEstimate {
    /// 校验阶段工期之和等于总工期
    pub fn stages_consistent(&self) -> bool {
        let sum: i64 = self.per_stage_days.iter().map(|s| s.days).sum();
        sum == self.total_days && self.per_stage_days.iter().all(|s| s.days >= 1)
    }

    /// 查询单个阶段的工期
    pub fn days_for(&self, stage: Stage) -> Option<i64> {
        self.per_stage_days
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.days)
    }
}
