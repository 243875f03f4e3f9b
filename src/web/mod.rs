//! Web 服务器模块
//!
//! 对外提供批量翻译接口与界面静态资源，并管理调度器投喂循环的生命周期。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use handlers::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::adapters::{TextSegmenter, TranslationEngine};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::orchestrator::Orchestrator;
use crate::scheduler::{Scheduler, SchedulerConfig};

/// Web 服务器
pub struct WebServer {
    config: GatewayConfig,
    engine: Arc<dyn TranslationEngine>,
    segmenter: Arc<dyn TextSegmenter>,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(
        config: GatewayConfig,
        engine: Arc<dyn TranslationEngine>,
        segmenter: Arc<dyn TextSegmenter>,
    ) -> Self {
        Self {
            config,
            engine,
            segmenter,
        }
    }

    /// 启动 Web 服务器，收到 Ctrl-C 后优雅退出
    pub async fn start(self) -> GatewayResult<()> {
        let web_config = WebConfig::from(&self.config.server);
        web_config.check_static_dir();

        let scheduler = Scheduler::new(SchedulerConfig::from(&self.config.engine), self.engine);
        let feeder = scheduler.start();

        let orchestrator = Orchestrator::new(
            scheduler,
            self.segmenter,
            self.config.engine.default_priority,
        );
        let app_state = Arc::new(AppState::new(orchestrator, self.config));
        let app = create_router(app_state, &web_config);

        let listener = tokio::net::TcpListener::bind(web_config.listen_address())
            .await
            .map_err(|e| {
                GatewayError::from(e).with_context(format!("绑定地址 {}", web_config.listen_address()))
            })?;

        tracing::info!("翻译网关启动于 http://{}", web_config.listen_address());

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        feeder.abort();
        tracing::info!("翻译网关已停止");

        Ok(served?)
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let mut app = create_routes().with_state(app_state);

    // 添加CORS支持
    app = app.layer(CorsLayer::permissive());

    if let Some(static_dir) = &config.static_dir {
        app = app.nest_service("/ui", ServeDir::new(static_dir));
    }

    app
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，开始优雅停机");
}
