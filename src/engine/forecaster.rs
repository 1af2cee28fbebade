// ==========================================
// 制造运营排程系统 - 时间序列预测引擎
// ==========================================
// 职责: 从历史日观测序列产出前瞻需求/负荷序列
// 策略: 简单指数平滑 / 季节性三重平滑 / 可替换序列模型
// 红线: 策略均为输入序列的纯函数；空序列与单点序列一律返回零序列
// ==========================================

use crate::config::ForecastParams;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// ForecastStrategy - 预测策略接口
// ==========================================
/// 预测策略
///
/// 输出长度恒等于 horizon 的有限序列；调用方每次请求一个新的 horizon，
/// 序列不可续播
pub trait ForecastStrategy {
    fn forecast(&self, series: &[f64], horizon: usize) -> Vec<f64>;

    /// 策略名（日志与可解释性输出）
    fn name(&self) -> &'static str;
}

// ==========================================
// SimpleExponentialSmoothing - 简单指数平滑
// ==========================================
// 递推: s_t = α·x_t + (1-α)·s_{t-1}, s_0 = x_0
// 输出: 末端平滑水平在整个 horizon 上的平推
pub struct SimpleExponentialSmoothing {
    pub alpha: f64,
}

impl SimpleExponentialSmoothing {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// 对整条序列做平滑，返回末端水平
    fn smoothed_level(&self, series: &[f64]) -> f64 {
        let mut level = series[0];
        for &x in &series[1..] {
            level = self.alpha * x + (1.0 - self.alpha) * level;
        }
        level
    }
}

impl ForecastStrategy for SimpleExponentialSmoothing {
    fn forecast(&self, series: &[f64], horizon: usize) -> Vec<f64> {
        if series.len() < 2 {
            return vec![0.0; horizon];
        }
        let level = self.smoothed_level(series);
        vec![level; horizon]
    }

    fn name(&self) -> &'static str {
        "SIMPLE_EXPONENTIAL_SMOOTHING"
    }
}

// ==========================================
// SeasonalSmoothing - 季节性三重平滑
// ==========================================
// 要求: len(series) >= 2×季节长度，否则退化为均值平推
// 分解: 水平 + 趋势 + 按相位的乘法季节因子（由前两个季节初始化）
pub struct SeasonalSmoothing {
    pub season_length: usize,
    pub alpha: f64, // 水平平滑系数
    pub beta: f64,  // 趋势平滑系数
    pub gamma: f64, // 季节因子平滑系数
}

impl SeasonalSmoothing {
    pub fn new(season_length: usize, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            season_length,
            alpha,
            beta,
            gamma,
        }
    }

    /// 均值平推（历史不足时的退化输出）
    fn mean_fallback(series: &[f64], horizon: usize) -> Vec<f64> {
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        vec![mean; horizon]
    }
}

impl ForecastStrategy for SeasonalSmoothing {
    fn forecast(&self, series: &[f64], horizon: usize) -> Vec<f64> {
        if series.len() < 2 {
            return vec![0.0; horizon];
        }

        let season = self.season_length;
        if season == 0 || series.len() < 2 * season {
            debug!(
                series_len = series.len(),
                season_length = season,
                "历史不足两个季节，退化为均值平推"
            );
            return Self::mean_fallback(series, horizon);
        }

        // ===== 由前两个季节初始化 =====
        let first: &[f64] = &series[..season];
        let second: &[f64] = &series[season..2 * season];
        let avg1 = first.iter().sum::<f64>() / season as f64;
        let avg2 = second.iter().sum::<f64>() / season as f64;

        // 季节均值为 0 时乘法分解无意义，退化为均值平推
        if avg1 <= 0.0 || avg2 <= 0.0 {
            return Self::mean_fallback(series, horizon);
        }

        let mut level = avg1;
        let mut trend = (avg2 - avg1) / season as f64;
        let mut seasonal: Vec<f64> = (0..season)
            .map(|i| (first[i] / avg1 + second[i] / avg2) / 2.0)
            .collect();

        // ===== 逐步更新剩余观测 =====
        for (t, &x) in series.iter().enumerate().skip(2 * season) {
            let phase = t % season;
            let factor = if seasonal[phase].abs() < f64::EPSILON {
                1.0
            } else {
                seasonal[phase]
            };

            let prev_level = level;
            level = self.alpha * (x / factor) + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
            if level.abs() > f64::EPSILON {
                seasonal[phase] = self.gamma * (x / level) + (1.0 - self.gamma) * seasonal[phase];
            }
        }

        // ===== 前瞻输出: (水平+趋势)×季节因子[相位] =====
        let n = series.len();
        (0..horizon)
            .map(|h| (level + trend) * seasonal[(n + h) % season])
            .collect()
    }

    fn name(&self) -> &'static str {
        "SEASONAL_SMOOTHING"
    }
}

// ==========================================
// SequencePredictor - 可替换序列模型接口
// ==========================================
/// 单步序列预测器
///
/// 契约: 输入最近 N 个归一化观测，输出下一个归一化值。
/// 统计策略与学习型模型实现同一接口，由配置选择。
pub trait SequencePredictor: Send + Sync {
    fn predict(&self, window: &[f64]) -> f64;
}

/// 末值平推预测器（序列模型的占位实现，保留接口以便将来替换）
pub struct LastValuePredictor;

impl SequencePredictor for LastValuePredictor {
    fn predict(&self, window: &[f64]) -> f64 {
        window.last().copied().unwrap_or(0.0)
    }
}

// ==========================================
// AutoRegressiveStrategy - 自回归滚动策略
// ==========================================
// 在 min-max 归一化输入上逐步滚动 predict，输出反归一化序列
pub struct AutoRegressiveStrategy {
    predictor: Arc<dyn SequencePredictor>,
    window_size: usize,
}

impl AutoRegressiveStrategy {
    pub fn new(predictor: Arc<dyn SequencePredictor>, window_size: usize) -> Self {
        Self {
            predictor,
            window_size: window_size.max(1),
        }
    }
}

impl ForecastStrategy for AutoRegressiveStrategy {
    fn forecast(&self, series: &[f64], horizon: usize) -> Vec<f64> {
        if series.len() < 2 {
            return vec![0.0; horizon];
        }

        let (normalized, min, max) = min_max_normalize(series);
        let range = max - min;

        let start = normalized.len().saturating_sub(self.window_size);
        let mut window: Vec<f64> = normalized[start..].to_vec();

        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = self.predictor.predict(&window);
            out.push(next * range + min); // 反归一化
            window.push(next);
            if window.len() > self.window_size {
                window.remove(0);
            }
        }
        out
    }

    fn name(&self) -> &'static str {
        "AUTO_REGRESSIVE"
    }
}

/// min-max 归一化
///
/// # 返回
/// (归一化序列, min, max)；全等序列 (max==min) 归一化为全 0
pub fn min_max_normalize(series: &[f64]) -> (Vec<f64>, f64, f64) {
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 {
        return (vec![0.0; series.len()], min, min);
    }
    let normalized = series.iter().map(|&x| (x - min) / range).collect();
    (normalized, min, max)
}

// ==========================================
// TimeSeriesForecaster - 预测引擎门面
// ==========================================
pub struct TimeSeriesForecaster {
    params: ForecastParams,
}

impl TimeSeriesForecaster {
    /// 构造函数
    pub fn new(params: ForecastParams) -> Self {
        Self { params }
    }

    /// 使用指定策略产出长度为 horizon 的预测序列
    ///
    /// # 边界
    /// - 空序列或单点序列: 返回全 0 序列
    /// - horizon == 0: 返回空序列
    pub fn forecast(
        &self,
        series: &[f64],
        horizon: usize,
        strategy: &dyn ForecastStrategy,
    ) -> Vec<f64> {
        if horizon == 0 {
            return Vec::new();
        }
        if series.len() < 2 {
            return vec![0.0; horizon];
        }
        strategy.forecast(series, horizon)
    }

    /// 按配置构造简单指数平滑策略
    pub fn simple_smoothing(&self) -> SimpleExponentialSmoothing {
        SimpleExponentialSmoothing::new(self.params.alpha)
    }

    /// 按配置构造季节性平滑策略（季节长度由调用方指定）
    pub fn seasonal_smoothing(&self, season_length: usize) -> SeasonalSmoothing {
        SeasonalSmoothing::new(
            season_length,
            self.params.alpha,
            self.params.beta,
            self.params.gamma,
        )
    }
}
