//! ServicesFactory 实现：从配置构建 llm / retry strategy / process runner，供 CLI 复用。
use async_trait::async_trait;
use codepilot_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services> {
        let llm = factory::build_llm(cfg)?;
        let retry_strategy = factory::build_retry_strategy(cfg);
        let process_runner = factory::build_process_runner(cfg);
        Ok(Services {
            llm,
            retry_strategy,
            process_runner,
            editor: None,
        })
    }
}
