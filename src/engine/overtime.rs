// ==========================================
// 制造运营排程系统 - 加班恢复计算引擎
// ==========================================
// 职责: 由上报延期与完成度推算加班需求与交期影响
// 红线: 无状态、无副作用；"当前日期"一律经 as_of 显式传入
// ==========================================
// 公式:
//   remaining = estimated_hours × (100 - completion) / 100
//   required_overtime = remaining / overtime_efficiency   (效率<1 建模疲劳)
//   recoverable_days = floor(required_overtime / (max_overtime × efficiency))
//   影响交期 ⇔ as_of + ceil(required_overtime / max_overtime) 天 > due_date
// ==========================================

use crate::domain::delay::{OvertimePolicy, OvertimeRecovery};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDate};

// ==========================================
// OvertimeRecoveryCalculator - 加班恢复计算引擎
// ==========================================
pub struct OvertimeRecoveryCalculator {
    // 无状态引擎，不需要注入依赖
}

impl OvertimeRecoveryCalculator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算延期任务的加班恢复方案
    ///
    /// # 参数
    /// - `estimated_hours`: 任务预估总工时
    /// - `completion_percent`: 上报完成度 (0-100)
    /// - `due_date`: 任务交期
    /// - `as_of`: 计算基准日（显式传入，不读系统时钟）
    /// - `policy`: 加班政策
    ///
    /// # 返回
    /// - Ok(OvertimeRecovery)
    /// - Err(InvalidProfile): 完成度越界 / 工时为负 / 政策参数非法
    pub fn recover(
        &self,
        estimated_hours: f64,
        completion_percent: f64,
        due_date: NaiveDate,
        as_of: NaiveDate,
        policy: &OvertimePolicy,
    ) -> EngineResult<OvertimeRecovery> {
        if !(0.0..=100.0).contains(&completion_percent) {
            return Err(EngineError::InvalidProfile(format!(
                "完成度越界: {}",
                completion_percent
            )));
        }
        if estimated_hours < 0.0 || !estimated_hours.is_finite() {
            return Err(EngineError::InvalidProfile(format!(
                "预估工时非法: {}",
                estimated_hours
            )));
        }
        if policy.overtime_efficiency <= 0.0 || policy.overtime_efficiency > 1.0 {
            return Err(EngineError::InvalidProfile(format!(
                "加班效率系数非法: {}",
                policy.overtime_efficiency
            )));
        }
        if policy.max_overtime_hours_per_day <= 0.0 {
            return Err(EngineError::InvalidProfile(format!(
                "每日加班上限非法: {}",
                policy.max_overtime_hours_per_day
            )));
        }

        let remaining_hours = estimated_hours * (100.0 - completion_percent) / 100.0;
        let required_overtime_hours = remaining_hours / policy.overtime_efficiency;

        let recoverable_days = (required_overtime_hours
            / (policy.max_overtime_hours_per_day * policy.overtime_efficiency))
            .floor() as i64;

        let catch_up_days =
            (required_overtime_hours / policy.max_overtime_hours_per_day).ceil() as i64;
        let new_completion_date = as_of + Duration::days(catch_up_days);
        let impacts_deadline = new_completion_date > due_date;

        Ok(OvertimeRecovery {
            required_overtime_hours,
            recoverable_days,
            new_completion_date,
            impacts_deadline,
        })
    }
}

impl Default for OvertimeRecoveryCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_half_done_task_overtime_hours() {
        // 测试: 预估 40h, 完成 50%, 效率 0.75
        // remaining = 20h, required_overtime = 26.67h
        let calc = OvertimeRecoveryCalculator::new();
        let policy = OvertimePolicy::default();

        let result = calc
            .recover(40.0, 50.0, d(2026, 9, 1), d(2026, 8, 10), &policy)
            .unwrap();

        assert!((result.required_overtime_hours - 26.666_666_666_666_668).abs() < 1e-9);
        // floor(26.67 / (4 × 0.75)) = floor(8.89) = 8
        assert_eq!(result.recoverable_days, 8);
        // ceil(26.67 / 4) = 7 天追赶
        assert_eq!(result.new_completion_date, d(2026, 8, 17));
        assert!(!result.impacts_deadline);
    }

    #[test]
    fn test_deadline_impact_flag() {
        // 交期在追赶期之内 → 影响交期
        let calc = OvertimeRecoveryCalculator::new();
        let policy = OvertimePolicy::default();

        let result = calc
            .recover(40.0, 50.0, d(2026, 8, 12), d(2026, 8, 10), &policy)
            .unwrap();
        assert!(result.impacts_deadline);
    }

    #[test]
    fn test_monotonic_in_completion_percent() {
        // 完成度提高 → 加班需求严格递减
        let calc = OvertimeRecoveryCalculator::new();
        let policy = OvertimePolicy::default();

        let mut prev = f64::INFINITY;
        for pct in [0.0, 10.0, 25.0, 50.0, 75.0, 90.0, 99.0] {
            let result = calc
                .recover(40.0, pct, d(2026, 9, 1), d(2026, 8, 10), &policy)
                .unwrap();
            assert!(result.required_overtime_hours < prev, "pct={}", pct);
            prev = result.required_overtime_hours;
        }
    }

    #[test]
    fn test_fully_completed_needs_no_overtime() {
        let calc = OvertimeRecoveryCalculator::new();
        let policy = OvertimePolicy::default();

        let result = calc
            .recover(40.0, 100.0, d(2026, 9, 1), d(2026, 8, 10), &policy)
            .unwrap();
        assert_eq!(result.required_overtime_hours, 0.0);
        assert_eq!(result.recoverable_days, 0);
        assert_eq!(result.new_completion_date, d(2026, 8, 10));
        assert!(!result.impacts_deadline);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let calc = OvertimeRecoveryCalculator::new();
        let policy = OvertimePolicy::default();

        assert!(calc
            .recover(40.0, 120.0, d(2026, 9, 1), d(2026, 8, 10), &policy)
            .is_err());
        assert!(calc
            .recover(-1.0, 50.0, d(2026, 9, 1), d(2026, 8, 10), &policy)
            .is_err());

        let bad_policy = OvertimePolicy {
            overtime_efficiency: 0.0,
            ..OvertimePolicy::default()
        };
        assert!(calc
            .recover(40.0, 50.0, d(2026, 9, 1), d(2026, 8, 10), &bad_policy)
            .is_err());
    }
}
