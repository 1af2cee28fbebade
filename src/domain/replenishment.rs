// ==========================================
// 制造运营排程系统 - 补货建议领域模型
// ==========================================
// 用途: 基于需求预测派生的库存控制参数
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ReplenishmentAdvice - 补货建议
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentAdvice {
    pub material_id: String,           // 物料ID
    pub avg_daily_demand: f64,         // 预测期内日均需求
    pub demand_std_dev: f64,           // 历史需求标准差
    pub safety_stock: f64,             // 安全库存
    pub reorder_point: f64,            // 再订货点
    pub economic_order_quantity: f64,  // 经济订货量 (EOQ)
}
