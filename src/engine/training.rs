// ==========================================
// 制造运营排程系统 - 训练协调器
// ==========================================
// 职责: 序列模型训练的互斥控制（进程级同时至多一个训练）
// 约束: 并发的第二个训练请求立即拒绝，不排队、不静默忽略
// 说明: 以显式对象持有状态并注入调用方，状态经原子 CAS 保护，
//       取代游离的全局可变标志
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;

// ==========================================
// TrainingCoordinator - 训练协调器
// ==========================================
pub struct TrainingCoordinator {
    training_in_progress: AtomicBool,
    last_training_date: Mutex<Option<NaiveDate>>,
}

impl TrainingCoordinator {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            training_in_progress: AtomicBool::new(false),
            last_training_date: Mutex::new(None),
        }
    }

    /// 申请开始训练
    ///
    /// # 返回
    /// - Ok(TrainingGuard): 获得训练权；guard 释放（drop）时自动让出
    /// - Err(TrainingInProgress): 已有训练在进行
    pub fn begin(&self) -> EngineResult<TrainingGuard<'_>> {
        self.training_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::TrainingInProgress)?;
        Ok(TrainingGuard { coordinator: self })
    }

    /// 是否有训练在进行
    pub fn is_training(&self) -> bool {
        self.training_in_progress.load(Ordering::Acquire)
    }

    /// 最近一次成功训练的日期
    pub fn last_training_date(&self) -> Option<NaiveDate> {
        *self.last_training_date.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_completion(&self, as_of: NaiveDate) {
        let mut guard = self
            .last_training_date
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *guard = Some(as_of);
    }
}

impl Default for TrainingCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// TrainingGuard - 训练权守卫
// ==========================================
// RAII: drop 时让出训练权；只有显式 finish 才记录完成日期
pub struct TrainingGuard<'a> {
    coordinator: &'a TrainingCoordinator,
}

impl TrainingGuard<'_> {
    /// 标记训练成功完成并记录完成日期
    pub fn finish(self, as_of: NaiveDate) {
        self.coordinator.record_completion(as_of);
        info!(as_of = %as_of, "序列模型训练完成");
        // drop 让出训练权
    }
}

impl Drop for TrainingGuard<'_> {
    fn drop(&mut self) {
        self.coordinator
            .training_in_progress
            .store(false, Ordering::Release);
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
    fn test_concurrent_begin_rejected() {
        // 第二个并发训练请求必须立即拒绝
        let coordinator = TrainingCoordinator::new();
        let guard = coordinator.begin().unwrap();
        assert!(coordinator.is_training());

        match coordinator.begin() {
            Err(EngineError::TrainingInProgress) => {}
            other => panic!("expected TrainingInProgress, got {:?}", other.map(|_| ())),
        }

        drop(guard);
        assert!(!coordinator.is_training());
        // 释放后可再次开始
        assert!(coordinator.begin().is_ok());
    }

    #[test]
    fn test_finish_records_date() {
        let coordinator = TrainingCoordinator::new();
        assert_eq!(coordinator.last_training_date(), None);

        let guard = coordinator.begin().unwrap();
        guard.finish(d(2026, 8, 10));

        assert!(!coordinator.is_training());
        assert_eq!(coordinator.last_training_date(), Some(d(2026, 8, 10)));
    }

    #[test]
    fn test_abandoned_training_releases_without_date() {
        // 训练失败（guard 直接 drop）: 让出训练权但不记录完成日期
        let coordinator = TrainingCoordinator::new();
        {
            let _guard = coordinator.begin().unwrap();
        }
        assert!(!coordinator.is_training());
        assert_eq!(coordinator.last_training_date(), None);
    }

    #[test]
    fn test_only_one_thread_wins() {
        use std::sync::{Arc, Barrier};

        let coordinator = Arc::new(TrainingCoordinator::new());
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let c = Arc::clone(&coordinator);
            let b = Arc::clone(&barrier);
            handles.push(std::thread::spawn(move || {
                b.wait();
                match c.begin() {
                    Ok(guard) => {
                        // 持有训练权直到所有线程完成尝试
                        b.wait();
                        drop(guard);
                        true
                    }
                    Err(_) => {
                        b.wait();
                        false
                    }
                }
            }));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
    }
}
