//! Store Server - 电商店面订单聚合与奖励叠加引擎
//!
//! # 架构概述
//!
//! 本模块是订单聚合引擎的主入口，提供以下核心功能：
//!
//! - **批次生命周期** (`batches`): pending/validated/expired 状态机与过期扫描
//! - **钱包** (`rewards`): 幂等奖励入账、等级倍率、余额
//! - **满额赠品** (`gift`): 累计消费阈值评估
//! - **优惠券** (`coupons`): 单次使用券的选择与核销
//! - **结算** (`checkout`): 券→钱包固定顺序的金额合成与支付编排
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/           # 配置、状态、服务器、后台任务
//! ├── identity/       # 匿名身份令牌
//! ├── api/            # HTTP 路由和处理器
//! ├── db/             # SQLite 连接与仓储
//! ├── money/          # Decimal 金额工具
//! ├── collaborators/  # 支付 / 订单创建 / 通知协作方
//! ├── batches/        # 批次状态机
//! ├── rewards/        # 钱包与等级
//! ├── gift/           # 满额赠品
//! ├── coupons/        # 优惠券
//! └── checkout/       # 结算聚合
//! ```

pub mod api;
pub mod batches;
pub mod checkout;
pub mod collaborators;
pub mod core;
pub mod coupons;
pub mod db;
pub mod gift;
pub mod identity;
pub mod money;
pub mod rewards;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use identity::{CurrentShopper, TokenService};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置环境 (dotenv)
pub fn setup_environment() {
    dotenv::dotenv().ok();
}
