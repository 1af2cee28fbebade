// ==========================================
// 制造运营排程系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 工期预估与产能排程引擎 (决策支持)
// ==========================================

use anyhow::Context;
use mfg_planning_engine::db;
use mfg_planning_engine::{logging, PlanningApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 工期预估与产能排程引擎", mfg_planning_engine::APP_NAME);
    tracing::info!("系统版本: {}", mfg_planning_engine::VERSION);
    tracing::info!("==================================================");

    // 数据库路径: 第一个命令行参数，缺省取环境变量/默认文件
    let db_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MFG_PLANNING_DB").ok())
        .unwrap_or_else(|| "mfg_planning.db".to_string());
    tracing::info!("使用数据库: {}", db_path);

    // schema 版本检查（只告警，不自动迁移）
    {
        let conn = db::open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        match db::read_schema_version(&conn)? {
            Some(version) if version == db::CURRENT_SCHEMA_VERSION => {
                tracing::info!("schema_version = {}", version);
            }
            Some(version) => {
                tracing::warn!(
                    "schema_version 不匹配: 库中={}, 期望={}（请核对迁移状态）",
                    version,
                    db::CURRENT_SCHEMA_VERSION
                );
            }
            None => {
                tracing::warn!(
                    "schema_version 表缺失（新库请先运行 generate_test_data 或迁移脚本）"
                );
            }
        }
    }

    // 构建业务门面
    let api = PlanningApi::new(&db_path)
        .map_err(|e| anyhow::anyhow!("初始化业务接口失败: {}", e))?;

    tracing::info!(
        "业务接口就绪: 相似度阈值={}, 扫描窗口={}天, 默认工期={}天",
        api.params().similarity.min_score,
        api.params().schedule.scan_window_days,
        api.params().aggregate.default_total_days
    );
    tracing::info!("本进程为库宿主演示入口，业务调用经 PlanningApi 发起");

    Ok(())
}
