//! Bazaar Server - 多商户市场后端结算核心
//!
//! # 架构概述
//!
//! 买家下单 → 上传付款凭证 → 管理员确认到账 → 一次事务内给所有卖家分账 →
//! 卖家释放商品 → 订单完结。卖家可随时对自己的账本余额发起提现。
//!
//! # 模块结构
//!
//! ```text
//! bazaar-server/src/
//! ├── server/      # 配置、状态 (依赖注入根)、调用方身份
//! ├── api/         # HTTP 路由和处理器
//! ├── store/       # redb 事务存储 (账户/流水/订单/购物车)
//! ├── models/      # 领域模型
//! ├── catalog/     # 外部协作方接口 (商品目录/身份/对象存储)
//! ├── cart         # 购物车聚合
//! ├── orders       # 订单构建 + 履约状态机
//! ├── payments     # 付款凭证采集
//! ├── settlement   # 结算引擎 (核心)
//! ├── ledger       # 账户/提现工作流
//! └── utils/       # 错误、日志、时间、校验
//! ```

pub mod api;
pub mod cart;
pub mod catalog;
pub mod ledger;
pub mod models;
pub mod money;
pub mod orders;
pub mod payments;
pub mod server;
pub mod settlement;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use cart::CartService;
pub use ledger::AccountService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use server::{AppState, Caller, Config};
pub use settlement::SettlementService;
pub use store::MarketStore;
pub use utils::{AppError, AppResult, ServiceError, ServiceResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
