// ==========================================
// 制造运营排程系统 - 补货建议引擎
// ==========================================
// 职责: 基于需求预测派生安全库存 / 再订货点 / 经济订货量
// 输入: 物料历史日需求序列（复用时间序列预测引擎）
// 输出: ReplenishmentAdvice
// ==========================================
// 公式:
//   safety_stock = z × σ × sqrt(lead_time)
//   reorder_point = 日均需求 × lead_time + safety_stock
//   EOQ = sqrt(2 × 年需求 × 订货成本 / 单位持有成本)
// ==========================================

use crate::config::{ForecastParams, ReplenishmentParams};
use crate::domain::replenishment::ReplenishmentAdvice;
use crate::engine::forecaster::TimeSeriesForecaster;
use tracing::instrument;

// ==========================================
// StockReplenishmentAdvisor - 补货建议引擎
// ==========================================
pub struct StockReplenishmentAdvisor {
    params: ReplenishmentParams,
    forecaster: TimeSeriesForecaster,
}

impl StockReplenishmentAdvisor {
    /// 构造函数
    pub fn new(params: ReplenishmentParams, forecast_params: ForecastParams) -> Self {
        Self {
            params,
            forecaster: TimeSeriesForecaster::new(forecast_params),
        }
    }

    /// 产出补货建议
    ///
    /// 口径:
    /// - 日均需求取提前期范围内预测序列的均值（指数平滑策略）
    /// - σ 取历史序列的总体标准差
    ///
    /// # 边界
    /// 空序列或单点序列: 预测为零序列，建议各项为 0
    #[instrument(skip(self, demand_series), fields(
        material_id = %material_id,
        series_len = demand_series.len()
    ))]
    pub fn recommend(&self, material_id: &str, demand_series: &[f64]) -> ReplenishmentAdvice {
        let lead_time = self.params.lead_time_days.max(1);
        let strategy = self.forecaster.simple_smoothing();
        let forecast = self.forecaster.forecast(demand_series, lead_time, &strategy);

        let avg_daily_demand = if forecast.is_empty() {
            0.0
        } else {
            forecast.iter().sum::<f64>() / forecast.len() as f64
        };
        let demand_std_dev = Self::std_dev(demand_series);

        let safety_stock =
            self.params.service_factor * demand_std_dev * (lead_time as f64).sqrt();
        let reorder_point = avg_daily_demand * lead_time as f64 + safety_stock;

        let annual_demand = avg_daily_demand * 365.0;
        let economic_order_quantity =
            if annual_demand > 0.0 && self.params.holding_cost_per_unit > 0.0 {
                (2.0 * annual_demand * self.params.ordering_cost
                    / self.params.holding_cost_per_unit)
                    .sqrt()
            } else {
                0.0
            };

        ReplenishmentAdvice {
            material_id: material_id.to_string(),
            avg_daily_demand,
            demand_std_dev,
            safety_stock,
            reorder_point,
            economic_order_quantity,
        }
    }

    /// 总体标准差
    fn std_dev(series: &[f64]) -> f64 {
        if series.len() < 2 {
            return 0.0;
        }
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        let variance =
            series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / series.len() as f64;
        variance.sqrt()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn advisor() -> StockReplenishmentAdvisor {
        StockReplenishmentAdvisor::new(ReplenishmentParams::default(), ForecastParams::default())
    }

    #[test]
    fn test_constant_demand_has_zero_safety_stock() {
        // 恒定需求: σ=0 → 安全库存 0, 再订货点 = 日需求 × 提前期
        let advice = advisor().recommend("MAT-001", &[10.0; 30]);

        assert!((advice.avg_daily_demand - 10.0).abs() < 1e-9);
        assert_eq!(advice.demand_std_dev, 0.0);
        assert_eq!(advice.safety_stock, 0.0);
        assert!((advice.reorder_point - 70.0).abs() < 1e-9); // 10 × 7
    }

    #[test]
    fn test_eoq_square_root_formula() {
        // EOQ = sqrt(2 × 3650 × 200 / 2) = sqrt(730000) ≈ 854.4
        let advice = advisor().recommend("MAT-001", &[10.0; 30]);
        let expected = (2.0_f64 * 3650.0 * 200.0 / 2.0).sqrt();
        assert!((advice.economic_order_quantity - expected).abs() < 1e-6);
    }

    #[test]
    fn test_volatile_demand_increases_safety_stock() {
        // 波动需求: σ>0 → 安全库存为正, 再订货点高于纯需求项
        let series: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 5.0 } else { 15.0 }).collect();
        let advice = advisor().recommend("MAT-002", &series);

        assert!(advice.demand_std_dev > 0.0);
        assert!(advice.safety_stock > 0.0);
        assert!(advice.reorder_point > advice.avg_daily_demand * 7.0);
    }

    #[test]
    fn test_empty_series_yields_zero_advice() {
        let advice = advisor().recommend("MAT-003", &[]);
        assert_eq!(advice.avg_daily_demand, 0.0);
        assert_eq!(advice.safety_stock, 0.0);
        assert_eq!(advice.reorder_point, 0.0);
        assert_eq!(advice.economic_order_quantity, 0.0);
    }
}
