// ==========================================
// 制造运营排程系统 - 引擎参数
// ==========================================
// 职责: 引擎全部可调常量的类型化定义与默认值
// 存储: config_kv 表 (key = engine_params, JSON 覆写)
// 说明: 默认值是"选定的一套自洽常量"，不是唯一真值；
//       历史上存在 0.6/0.4 权重 + 0.5 阈值的变体，通过本配置即可切换
// ==========================================

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// config_kv 中引擎参数的键
pub const ENGINE_PARAMS_KEY: &str = "engine_params";

// ==========================================
// SimilarityParams - 相似度匹配参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityParams {
    pub category_weight: f64,   // 类别重合度权重
    pub complexity_weight: f64, // 复杂度邻近度权重
    pub min_score: f64,         // 候选保留阈值（严格变体可设 0.5）
    pub top_k: usize,           // 保留候选数
    pub parallel_threshold: usize, // 并行评分的记录数阈值
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            category_weight: 0.7,
            complexity_weight: 0.3,
            min_score: 0.4,
            top_k: 5,
            parallel_threshold: 256,
        }
    }
}

// ==========================================
// ForecastParams - 时间序列预测参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParams {
    pub alpha: f64,            // 指数平滑系数
    pub beta: f64,             // 趋势平滑系数（季节性策略）
    pub gamma: f64,            // 季节因子平滑系数
    pub season_length: usize,  // 季节长度（周=7 / 月度=12，由调用方指定）
    pub min_history: usize,    // 训练所需最少完工订单数
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            season_length: 7,
            min_history: 10,
        }
    }
}

// ==========================================
// AggregateParams - 预估聚合参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateParams {
    pub default_total_days: i64,        // 双失败时的兜底总工期
    pub medium_similarity_weight: f64,  // 相似置信=中 时的相似权重
    pub low_similarity_weight: f64,     // 相似置信=低 时的相似权重
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            default_total_days: 14,
            medium_similarity_weight: 0.7,
            low_similarity_weight: 0.3,
        }
    }
}

// ==========================================
// ScheduleParams - 产能排程参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    pub scan_window_days: i64,        // 起始日扫描窗口（隐式迭代上限）
    pub congested_conflict_limit: i64, // 达到该冲突数即标记 CONGESTED
    pub default_daily_slot_count: i64, // 未配置部门的保守槽位数
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            scan_window_days: 30,
            congested_conflict_limit: 3,
            default_daily_slot_count: 1,
        }
    }
}

// ==========================================
// ReplenishmentParams - 补货参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishmentParams {
    pub service_factor: f64,        // 服务水平系数 z (默认约 95%)
    pub lead_time_days: usize,      // 采购提前期（天）
    pub ordering_cost: f64,         // 单次订货成本
    pub holding_cost_per_unit: f64, // 单位年持有成本
}

impl Default for ReplenishmentParams {
    fn default() -> Self {
        Self {
            service_factor: 1.65,
            lead_time_days: 7,
            ordering_cost: 200.0,
            holding_cost_per_unit: 2.0,
        }
    }
}

// ==========================================
// EngineParams - 引擎参数全集
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub similarity: SimilarityParams,
    pub forecast: ForecastParams,
    pub aggregate: AggregateParams,
    pub schedule: ScheduleParams,
    pub replenishment: ReplenishmentParams,
    pub overtime: crate::domain::OvertimePolicy,
}

impl EngineParams {
    /// 从 config_kv 表加载参数覆写（scope_id='global'）
    ///
    /// # 返回
    /// - 存在覆写: 默认值之上应用 JSON 覆写后的参数
    /// - 不存在 / 表缺失: 默认参数
    pub fn load(conn: &Connection) -> Result<Self, Box<dyn Error>> {
        let raw: Option<String> = match conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            rusqlite::params![ENGINE_PARAMS_KEY],
            |row| row.get::<_, String>(0),
        ) {
            Ok(v) => Some(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            // 表不存在时退回默认参数（演示库/旧库兼容）
            Err(rusqlite::Error::SqliteFailure(_, Some(msg)))
                if msg.contains("no such table") =>
            {
                None
            }
            Err(e) => return Err(Box::new(e)),
        };

        match raw {
            Some(json) => {
                let params: EngineParams = serde_json::from_str(&json)?;
                Ok(params)
            }
            None => Ok(EngineParams::default()),
        }
    }
}
