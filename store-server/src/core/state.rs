//! Server State
//!
//! 持有所有服务的共享引用；使用 Arc 实现浅拷贝。

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::batches::BatchManager;
use crate::checkout::CheckoutService;
use crate::collaborators::{
    HttpOrderCreation, HttpPaymentGateway, MockOrderCreation, MockPaymentGateway,
    NotificationService, OrderCreationCollaborator, PaymentCollaborator,
};
use crate::core::Config;
use crate::coupons::CouponService;
use crate::db::DbService;
use crate::gift::GiftService;
use crate::identity::TokenService;
use crate::rewards::WalletService;

/// 服务器状态 - 各服务的单例引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | notify | 通知服务（仅供展示层消费） |
/// | tokens | 匿名身份令牌服务 |
/// | wallet | 钱包服务 |
/// | batches | 批次生命周期管理 |
/// | coupons | 优惠券服务 |
/// | gift | 满额赠品评估 |
/// | checkout | 结算聚合 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub notify: NotificationService,
    pub tokens: Arc<TokenService>,
    pub wallet: WalletService,
    pub batches: BatchManager,
    pub coupons: CouponService,
    pub gift: GiftService,
    pub checkout: CheckoutService,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 顺序：数据库 → 通知/令牌 → 协作方客户端 → 领域服务。
    /// 协作方地址未配置时退回内置 mock（开发模式）。
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        let db = DbService::new(&config.db_path)
            .await
            .expect("Failed to initialize database");
        let pool = db.pool;

        let notify = NotificationService::new();
        let tokens = Arc::new(TokenService::with_config(config.token.clone()));

        let payment: Arc<dyn PaymentCollaborator> = match &config.payment_base_url {
            Some(base_url) => Arc::new(HttpPaymentGateway::new(
                base_url.clone(),
                config.collaborator_timeout_ms,
            )),
            None => {
                tracing::warn!("PAYMENT_BASE_URL not set, using in-process mock gateway");
                Arc::new(MockPaymentGateway::approving())
            }
        };
        let order_creation: Arc<dyn OrderCreationCollaborator> =
            match &config.order_service_base_url {
                Some(base_url) => Arc::new(HttpOrderCreation::new(
                    base_url.clone(),
                    config.collaborator_timeout_ms,
                )),
                None => {
                    tracing::warn!("ORDER_SERVICE_BASE_URL not set, using in-process mock");
                    Arc::new(MockOrderCreation::succeeding())
                }
            };

        let wallet = WalletService::new(pool.clone(), notify.clone());
        let batches = BatchManager::new(
            pool.clone(),
            order_creation,
            notify.clone(),
            config.batch_window_ms,
        );
        let coupons = CouponService::new(pool.clone(), notify.clone());
        let gift = GiftService::new(pool.clone());
        let checkout = CheckoutService::new(
            pool.clone(),
            payment,
            batches.clone(),
            coupons.clone(),
            notify.clone(),
            config.currency.clone(),
        );

        Self {
            config: config.clone(),
            pool,
            notify,
            tokens,
            wallet,
            batches,
            coupons,
            gift,
            checkout,
        }
    }
}
