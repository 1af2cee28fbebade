// ==========================================
// 制造运营排程系统 - 产能排程引擎
// ==========================================
// 职责: 将工期预估落位为逐阶段日期区间，不超出部门日槽位
// 输入: 工期预估 + 部门产能配置 + 已承诺负荷快照 + 最早开始日
// 输出: ProductionSchedule (起止日期/阶段排期/冲突数/健康度/利用率)
// ==========================================
// 算法: 自最早开始日起向前扫描候选起始日（固定窗口即隐式迭代上限），
//       计算阶段背靠背落位时的逐日冲突数；记录最小冲突候选，
//       遇到零冲突候选立即采用。
// 说明: 贪心、不回溯、不并行独立阶段——这是有意保留的简化，
//       阶段一旦落位不再重排。
// 红线: 已承诺负荷每次调用重新取快照，不跨调用缓存；
//       原子占位由持久化协作方负责，本引擎只做计算
// ==========================================

use crate::config::ScheduleParams;
use crate::domain::estimate::DurationEstimate;
use crate::domain::schedule::{
    DepartmentCapacityProfile, DepartmentUtilization, ProductionSchedule, ScheduleSlot,
    StageAssignment,
};
use crate::domain::types::ScheduleHealth;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;
use tracing::{instrument, warn};

// ==========================================
// CapacityScheduler - 产能排程引擎
// ==========================================
pub struct CapacityScheduler {
    params: ScheduleParams,
}

impl CapacityScheduler {
    /// 构造函数
    pub fn new(params: ScheduleParams) -> Self {
        Self { params }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 产出产能约束下的生产排程
    ///
    /// # 参数
    /// - `order_id`: 订单ID
    /// - `estimate`: 工期预估（阶段拆分已完成）
    /// - `capacities`: 部门产能配置
    /// - `committed`: 已承诺负荷快照（调用时刻派生，本引擎不缓存）
    /// - `earliest_start`: 最早允许开始日
    ///
    /// # 返回
    /// ProductionSchedule。窗口内无零冲突起始日时返回最小冲突的
    /// 尽力而为排程（健康度标注），不抛错
    #[instrument(skip(self, estimate, capacities, committed), fields(
        order_id = %order_id,
        total_days = estimate.total_days,
        earliest_start = %earliest_start,
        committed_count = committed.len()
    ))]
    pub fn schedule(
        &self,
        order_id: &str,
        estimate: &DurationEstimate,
        capacities: &[DepartmentCapacityProfile],
        committed: &[ScheduleSlot],
        earliest_start: NaiveDate,
    ) -> ProductionSchedule {
        let capacity_map = self.build_capacity_map(capacities);
        let occupancy = Self::build_occupancy_map(committed);

        // 起始日搜索: 零冲突优先，否则最小冲突尽力而为
        let (start_date, conflict_count) = match self.find_zero_conflict_start(
            estimate,
            &capacity_map,
            &occupancy,
            earliest_start,
        ) {
            Ok(start) => (start, 0),
            Err(EngineError::NoFeasibleSlot { window_days }) => {
                let (best_start, best_conflicts) = self.find_min_conflict_start(
                    estimate,
                    &capacity_map,
                    &occupancy,
                    earliest_start,
                );
                warn!(
                    order_id = %order_id,
                    window_days,
                    conflicts = best_conflicts,
                    "窗口内无零冲突起始日，采用最小冲突落位"
                );
                (best_start, best_conflicts)
            }
            // find_zero_conflict_start 只产生 NoFeasibleSlot
            Err(_) => (earliest_start, 0),
        };

        let stages = Self::layout_stages(estimate, start_date);
        let health = self.assess_health(conflict_count);
        let department_utilization =
            self.compute_utilization(&stages, &capacity_map, &occupancy, earliest_start);

        let end_date = stages
            .last()
            .map(|s| s.end_date)
            .unwrap_or(start_date);

        ProductionSchedule {
            order_id: order_id.to_string(),
            start_date,
            end_date,
            stages,
            conflict_count,
            health,
            department_utilization,
        }
    }

    /// 兜底排程（负荷/产能数据不可用时的降级结果）
    ///
    /// 从给定日期直接背靠背落位，健康度标记 UNKNOWN，不做冲突评估
    pub fn fallback_schedule(
        &self,
        order_id: &str,
        estimate: &DurationEstimate,
        start_date: NaiveDate,
    ) -> ProductionSchedule {
        let stages = Self::layout_stages(estimate, start_date);
        let end_date = stages.last().map(|s| s.end_date).unwrap_or(start_date);
        ProductionSchedule {
            order_id: order_id.to_string(),
            start_date,
            end_date,
            stages,
            conflict_count: 0,
            health: ScheduleHealth::Unknown,
            department_utilization: Vec::new(),
        }
    }

    // ==========================================
    // 起始日搜索
    // ==========================================

    /// 在扫描窗口内寻找零冲突起始日
    ///
    /// # 返回
    /// - Ok(date): 最早的零冲突起始日
    /// - Err(NoFeasibleSlot): 窗口耗尽仍无零冲突候选
    fn find_zero_conflict_start(
        &self,
        estimate: &DurationEstimate,
        capacity_map: &HashMap<String, i64>,
        occupancy: &HashMap<(String, NaiveDate), i64>,
        earliest_start: NaiveDate,
    ) -> EngineResult<NaiveDate> {
        let window = self.params.scan_window_days.max(1);
        for offset in 0..window {
            let candidate = earliest_start + Duration::days(offset);
            let stages = Self::layout_stages(estimate, candidate);
            if Self::count_conflicts(&stages, capacity_map, occupancy) == 0 {
                return Ok(candidate);
            }
        }
        Err(EngineError::NoFeasibleSlot {
            window_days: window,
        })
    }

    /// 在扫描窗口内寻找最小冲突起始日（并列取最早）
    fn find_min_conflict_start(
        &self,
        estimate: &DurationEstimate,
        capacity_map: &HashMap<String, i64>,
        occupancy: &HashMap<(String, NaiveDate), i64>,
        earliest_start: NaiveDate,
    ) -> (NaiveDate, i64) {
        let window = self.params.scan_window_days.max(1);
        let mut best_start = earliest_start;
        let mut best_conflicts = i64::MAX;

        for offset in 0..window {
            let candidate = earliest_start + Duration::days(offset);
            let stages = Self::layout_stages(estimate, candidate);
            let conflicts = Self::count_conflicts(&stages, capacity_map, occupancy);
            if conflicts < best_conflicts {
                best_start = candidate;
                best_conflicts = conflicts;
            }
        }
        (best_start, best_conflicts)
    }

    /// 统计一组阶段排期的逐日冲突数
    ///
    /// 冲突口径: 某部门某日 已承诺数+本单占位(1) 达到或超过日槽位数
    fn count_conflicts(
        stages: &[StageAssignment],
        capacity_map: &HashMap<String, i64>,
        occupancy: &HashMap<(String, NaiveDate), i64>,
    ) -> i64 {
        let mut conflicts = 0;
        for assignment in stages {
            let slot_count = capacity_map
                .get(&assignment.department_code)
                .copied()
                .unwrap_or(1);
            let mut day = assignment.start_date;
            while day <= assignment.end_date {
                let committed = occupancy
                    .get(&(assignment.department_code.clone(), day))
                    .copied()
                    .unwrap_or(0);
                if committed + 1 >= slot_count {
                    conflicts += 1;
                }
                day += Duration::days(1);
            }
        }
        conflicts
    }

    // ==========================================
    // 阶段落位
    // ==========================================

    /// 从起始日起背靠背落位各阶段
    ///
    /// 阶段 i+1 从阶段 i 结束的次日开始；每阶段占用连续日历天
    fn layout_stages(estimate: &DurationEstimate, start_date: NaiveDate) -> Vec<StageAssignment> {
        let mut assignments = Vec::with_capacity(estimate.per_stage_days.len());
        let mut cursor = start_date;

        for stage_days in &estimate.per_stage_days {
            let days = stage_days.days.max(1);
            let end = cursor + Duration::days(days - 1);
            assignments.push(StageAssignment {
                stage: stage_days.stage,
                department_code: stage_days.stage.department_code().to_string(),
                start_date: cursor,
                end_date: end,
            });
            cursor = end + Duration::days(1);
        }
        assignments
    }

    // ==========================================
    // 健康度与利用率
    // ==========================================

    /// 冲突数 → 健康度标签
    fn assess_health(&self, conflict_count: i64) -> ScheduleHealth {
        if conflict_count == 0 {
            ScheduleHealth::Optimal
        } else if conflict_count < self.params.congested_conflict_limit {
            ScheduleHealth::Acceptable
        } else {
            ScheduleHealth::Congested
        }
    }

    /// 滚动窗口内的部门利用率
    ///
    /// 口径: (已承诺 + 本次落位) 占用槽位数 / (日槽位数 × 窗口内工作日数)；
    ///       不截断，>1.0 表示超额承诺
    fn compute_utilization(
        &self,
        stages: &[StageAssignment],
        capacity_map: &HashMap<String, i64>,
        occupancy: &HashMap<(String, NaiveDate), i64>,
        window_start: NaiveDate,
    ) -> Vec<DepartmentUtilization> {
        let window = self.params.scan_window_days.max(1);
        let window_end = window_start + Duration::days(window - 1);

        let business_days = Self::count_business_days(window_start, window_end);
        if business_days == 0 {
            return Vec::new();
        }

        // 部门全集: 产能配置中的部门 ∪ 本次落位涉及的部门
        let mut departments: Vec<String> = capacity_map.keys().cloned().collect();
        for a in stages {
            if !departments.contains(&a.department_code) {
                departments.push(a.department_code.clone());
            }
        }
        departments.sort();

        let mut result = Vec::with_capacity(departments.len());
        for dept in departments {
            let slot_count = capacity_map.get(&dept).copied().unwrap_or(1);

            // 已承诺占用（仅统计窗口内工作日）
            let mut occupied: i64 = 0;
            let mut day = window_start;
            while day <= window_end {
                if Self::is_business_day(day) {
                    occupied += occupancy.get(&(dept.clone(), day)).copied().unwrap_or(0);
                }
                day += Duration::days(1);
            }

            // 本次落位占用
            for a in stages.iter().filter(|a| a.department_code == dept) {
                let mut d = a.start_date.max(window_start);
                let end = a.end_date.min(window_end);
                while d <= end {
                    if Self::is_business_day(d) {
                        occupied += 1;
                    }
                    d += Duration::days(1);
                }
            }

            result.push(DepartmentUtilization {
                department_code: dept,
                occupied_slots: occupied,
                utilization: occupied as f64 / (slot_count * business_days) as f64,
            });
        }
        result
    }

    /// 是否工作日（周一至周五）
    fn is_business_day(date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 区间内工作日数（含首尾）
    fn count_business_days(start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut day = start;
        while day <= end {
            if Self::is_business_day(day) {
                count += 1;
            }
            day += Duration::days(1);
        }
        count
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 部门产能映射（未配置的部门按保守默认槽位数处理）
    fn build_capacity_map(&self, capacities: &[DepartmentCapacityProfile]) -> HashMap<String, i64> {
        let default_slots = self.params.default_daily_slot_count.max(1);
        let mut map: HashMap<String, i64> = HashMap::new();
        for profile in capacities {
            map.insert(
                profile.department_code.clone(),
                profile.daily_slot_count.max(1),
            );
        }
        // 四个固定部门兜底
        for stage in crate::domain::types::Stage::ALL {
            map.entry(stage.department_code().to_string())
                .or_insert(default_slots);
        }
        map
    }

    /// 已承诺负荷映射: (部门, 日期) → 占用数
    fn build_occupancy_map(committed: &[ScheduleSlot]) -> HashMap<(String, NaiveDate), i64> {
        let mut map: HashMap<(String, NaiveDate), i64> = HashMap::new();
        for slot in committed {
            *map.entry((slot.department_code.clone(), slot.date))
                .or_insert(0) += slot.occupied_count.max(0);
        }
        map
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::estimate::StageDays;
    use crate::domain::types::{ConfidenceTier, EstimateMethod, Stage};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn scheduler() -> CapacityScheduler {
        CapacityScheduler::new(ScheduleParams::default())
    }

    /// 创建测试用工期预估
    fn create_estimate(per_stage: &[(Stage, i64)]) -> DurationEstimate {
        let per_stage_days: Vec<StageDays> = per_stage
            .iter()
            .map(|(stage, days)| StageDays {
                stage: *stage,
                days: *days,
            })
            .collect();
        let total: i64 = per_stage_days.iter().map(|s| s.days).sum();
        DurationEstimate {
            total_days: total,
            per_stage_days,
            confidence: ConfidenceTier::Medium,
            method: EstimateMethod::Similarity,
        }
    }

    /// 四部门统一槽位数的产能配置
    fn uniform_capacities(daily_slot_count: i64) -> Vec<DepartmentCapacityProfile> {
        Stage::ALL
            .iter()
            .map(|s| DepartmentCapacityProfile {
                department_code: s.department_code().to_string(),
                daily_slot_count,
            })
            .collect()
    }

    fn slot(dept: &str, date: NaiveDate, occupied: i64) -> ScheduleSlot {
        ScheduleSlot {
            department_code: dept.to_string(),
            date,
            occupied_count: occupied,
        }
    }

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ==========================================
    // 基础功能测试
    // ==========================================

    #[test]
    fn test_free_calendar_starts_at_earliest() {
        // 空负荷: 起始日即最早开始日，零冲突，OPTIMAL
        let estimate = create_estimate(&[
            (Stage::Engineering, 2),
            (Stage::Assembly, 3),
            (Stage::Testing, 2),
            (Stage::Packaging, 1),
        ]);
        let result = scheduler().schedule(
            "ORD-001",
            &estimate,
            &uniform_capacities(2),
            &[],
            d(2026, 8, 10),
        );

        assert_eq!(result.start_date, d(2026, 8, 10));
        assert_eq!(result.conflict_count, 0);
        assert_eq!(result.health, ScheduleHealth::Optimal);
        // 2+3+2+1 = 8 天, 结束于 8/17
        assert_eq!(result.end_date, d(2026, 8, 17));
    }

    #[test]
    fn test_stages_sequential_no_overlap() {
        // 阶段 i+1 从阶段 i 结束次日开始
        let estimate = create_estimate(&[
            (Stage::Engineering, 3),
            (Stage::Assembly, 4),
            (Stage::Testing, 2),
            (Stage::Packaging, 1),
        ]);
        let result = scheduler().schedule(
            "ORD-002",
            &estimate,
            &uniform_capacities(2),
            &[],
            d(2026, 8, 10),
        );

        assert!(result.stages_sequential());
        assert_eq!(result.stages[0].start_date, d(2026, 8, 10));
        assert_eq!(result.stages[0].end_date, d(2026, 8, 12));
        assert_eq!(result.stages[1].start_date, d(2026, 8, 13));
        assert_eq!(result.stages[1].end_date, d(2026, 8, 16));
        assert_eq!(result.stages[2].start_date, d(2026, 8, 17));
        assert_eq!(result.stages[3].start_date, d(2026, 8, 19));
        assert_eq!(result.stages[3].end_date, d(2026, 8, 19));
    }

    #[test]
    fn test_committed_day_forces_start_advance() {
        // 测试: 部门槽位 2/日, 首日已有 3 个承诺任务
        // → 起始日必须越过首日，且首日候选冲突数 > 0
        let estimate = create_estimate(&[(Stage::Engineering, 1), (Stage::Assembly, 1), (Stage::Testing, 1), (Stage::Packaging, 1)]);
        let committed = vec![slot("ENG", d(2026, 8, 10), 3)];
        let capacities = uniform_capacities(2);
        let sched = scheduler();

        // 首日候选的冲突数 > 0（直接检验冲突口径）
        let capacity_map = sched.build_capacity_map(&capacities);
        let occupancy = CapacityScheduler::build_occupancy_map(&committed);
        let day1_stages = CapacityScheduler::layout_stages(&estimate, d(2026, 8, 10));
        assert!(CapacityScheduler::count_conflicts(&day1_stages, &capacity_map, &occupancy) > 0);

        let result = sched.schedule("ORD-003", &estimate, &capacities, &committed, d(2026, 8, 10));
        assert!(result.start_date > d(2026, 8, 10));
        assert_eq!(result.conflict_count, 0);
        assert_eq!(result.health, ScheduleHealth::Optimal);
    }

    #[test]
    fn test_congested_window_returns_best_effort() {
        // 窗口内所有工程日均满载: 仍返回排程（最小冲突），不抛错
        let estimate = create_estimate(&[(Stage::Engineering, 2), (Stage::Assembly, 1), (Stage::Testing, 1), (Stage::Packaging, 1)]);
        let capacities = uniform_capacities(2);
        let mut committed = Vec::new();
        let mut day = d(2026, 8, 10);
        // 覆盖扫描窗口 + 最长落位跨度
        for _ in 0..40 {
            committed.push(slot("ENG", day, 2));
            day += Duration::days(1);
        }

        let result = scheduler().schedule("ORD-004", &estimate, &capacities, &committed, d(2026, 8, 10));
        // 工程阶段 2 天全部冲突, 其余阶段空闲
        assert_eq!(result.conflict_count, 2);
        assert_eq!(result.health, ScheduleHealth::Acceptable);
        assert!(!result.stages.is_empty());
        // 并列最小冲突时取最早候选
        assert_eq!(result.start_date, d(2026, 8, 10));
    }

    #[test]
    fn test_conflict_threshold_maps_to_health() {
        let sched = scheduler();
        assert_eq!(sched.assess_health(0), ScheduleHealth::Optimal);
        assert_eq!(sched.assess_health(1), ScheduleHealth::Acceptable);
        assert_eq!(sched.assess_health(2), ScheduleHealth::Acceptable);
        assert_eq!(sched.assess_health(3), ScheduleHealth::Congested);
        assert_eq!(sched.assess_health(10), ScheduleHealth::Congested);
    }

    #[test]
    fn test_deterministic_round_trip() {
        // 相同的承诺快照 → 两次调用产出完全相同的排程
        let estimate = create_estimate(&[
            (Stage::Engineering, 2),
            (Stage::Assembly, 3),
            (Stage::Testing, 2),
            (Stage::Packaging, 1),
        ]);
        let capacities = uniform_capacities(3);
        let committed = vec![
            slot("ENG", d(2026, 8, 10), 2),
            slot("ASM", d(2026, 8, 14), 1),
        ];

        let sched = scheduler();
        let a = sched.schedule("ORD-005", &estimate, &capacities, &committed, d(2026, 8, 10));
        let b = sched.schedule("ORD-005", &estimate, &capacities, &committed, d(2026, 8, 10));

        assert_eq!(a.start_date, b.start_date);
        assert_eq!(a.end_date, b.end_date);
        assert_eq!(a.stages, b.stages);
        assert_eq!(a.conflict_count, b.conflict_count);
        assert_eq!(a.department_utilization, b.department_utilization);
    }

    #[test]
    fn test_zero_conflict_respects_capacity() {
        // 零冲突结果: 每个落位日 承诺+1 必须低于槽位数
        let estimate = create_estimate(&[(Stage::Engineering, 3), (Stage::Assembly, 2), (Stage::Testing, 1), (Stage::Packaging, 1)]);
        let capacities = uniform_capacities(3);
        let committed = vec![
            slot("ENG", d(2026, 8, 10), 2), // 2+1 >= 3 → 该日冲突
            slot("ENG", d(2026, 8, 11), 1), // 1+1 < 3 → 可用
        ];

        let result = scheduler().schedule("ORD-006", &estimate, &capacities, &committed, d(2026, 8, 10));
        assert_eq!(result.conflict_count, 0);

        let occupancy = CapacityScheduler::build_occupancy_map(&committed);
        for a in &result.stages {
            let mut day = a.start_date;
            while day <= a.end_date {
                let committed_count = occupancy
                    .get(&(a.department_code.clone(), day))
                    .copied()
                    .unwrap_or(0);
                assert!(committed_count + 1 < 3, "dept={} day={}", a.department_code, day);
                day += Duration::days(1);
            }
        }
    }

    #[test]
    fn test_utilization_window_math() {
        // 2026-08-10 (周一) 起 30 天窗口: 工作日 22 天
        let estimate = create_estimate(&[(Stage::Engineering, 2), (Stage::Assembly, 1), (Stage::Testing, 1), (Stage::Packaging, 1)]);
        let capacities = uniform_capacities(2);
        let result = scheduler().schedule("ORD-007", &estimate, &capacities, &[], d(2026, 8, 10));

        assert_eq!(
            CapacityScheduler::count_business_days(d(2026, 8, 10), d(2026, 9, 8)),
            22
        );

        let eng = result
            .department_utilization
            .iter()
            .find(|u| u.department_code == "ENG")
            .unwrap();
        // 工程阶段落位 8/10-8/11 两个工作日, 槽位 2 × 22 工作日
        assert_eq!(eng.occupied_slots, 2);
        assert!((eng.utilization - 2.0 / 44.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_department_uses_default_capacity() {
        // 产能配置缺失的部门按保守默认槽位兜底，不恐慌
        let estimate = create_estimate(&[(Stage::Engineering, 1), (Stage::Assembly, 1), (Stage::Testing, 1), (Stage::Packaging, 1)]);
        let result = scheduler().schedule("ORD-008", &estimate, &[], &[], d(2026, 8, 10));
        assert!(!result.stages.is_empty());
    }
}
