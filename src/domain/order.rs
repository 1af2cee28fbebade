// ==========================================
// 制造运营排程系统 - 订单领域模型
// ==========================================
// 职责: 新订单画像与历史完工订单事实
// 红线: 历史完工记录只读，引擎永不回写
// ==========================================

use crate::domain::types::{ComplexityTier, PriorityTier, Stage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// MaterialLine - 物料行
// ==========================================
// 类别集合开放: 允许出现新的类别标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub category_tag: String, // 物料类别标签
    pub quantity: f64,        // 数量
}

impl MaterialLine {
    pub fn new(category_tag: &str, quantity: f64) -> Self {
        Self {
            category_tag: category_tag.to_string(),
            quantity,
        }
    }
}

// ==========================================
// OrderProfile - 订单画像
// ==========================================
// 预估输入，不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProfile {
    pub complexity_tier: ComplexityTier,     // 复杂度档位
    pub priority_tier: PriorityTier,         // 优先级档位
    pub material_lines: Vec<MaterialLine>,   // 物料清单
    pub technical_attribute_count: u32,      // 技术属性数量
}

impl OrderProfile {
    /// 按类别聚合物料数量
    ///
    /// 同一类别出现多行时数量累加
    pub fn category_quantities(&self) -> HashMap<String, f64> {
        let mut map: HashMap<String, f64> = HashMap::new();
        for line in &self.material_lines {
            *map.entry(line.category_tag.clone()).or_insert(0.0) += line.quantity;
        }
        map
    }

    /// 校验订单画像
    ///
    /// # 返回
    /// - Ok(()): 画像合法
    /// - Err(String): 第一条违规原因（负数量/非有限数量/空类别标签）
    pub fn validate(&self) -> Result<(), String> {
        for line in &self.material_lines {
            if line.category_tag.trim().is_empty() {
                return Err("物料行类别标签为空".to_string());
            }
            if !line.quantity.is_finite() {
                return Err(format!(
                    "物料行数量非法: category={}, quantity={}",
                    line.category_tag, line.quantity
                ));
            }
            if line.quantity < 0.0 {
                return Err(format!(
                    "物料行数量为负: category={}, quantity={}",
                    line.category_tag, line.quantity
                ));
            }
        }
        Ok(())
    }
}

// ==========================================
// CompletedOrderRecord - 历史完工订单
// ==========================================
// 生命周期: 订单完工时由外部协作方写入; 本引擎只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrderRecord {
    pub order_id: String,                      // 订单ID
    pub profile: OrderProfile,                 // 完工时的订单画像
    pub actual_duration_days: i64,             // 实际总工期（天，> 0）
    pub per_stage_durations: Vec<(Stage, i64)>, // 各阶段实际工期（天）
    pub completed_date: NaiveDate,             // 完工日期（预测序列的观测键）
}
