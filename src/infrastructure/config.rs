use crate::application::panel_runner::OverlapPolicy;
use crate::domain::params::DashboardParams;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub elasticsearch: ElasticsearchSettings,
    pub panel: PanelSettings,
    /// Parameters of the dashboard whose pageload panel is refreshed
    #[serde(default)]
    pub dashboard: DashboardParams,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElasticsearchSettings {
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelSettings {
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

fn builder_with_defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.listen", "0.0.0.0:8080")?
        .set_default("elasticsearch.host", "http://localhost:9200")?
        .set_default("panel.refresh_interval_secs", 60)?)
}

/// Load `config/pageload`, overridable through `PAGELOAD__<SECTION>__<KEY>` variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder_with_defaults()?
        .add_source(File::with_name("config/pageload").required(false))
        .add_source(Environment::with_prefix("PAGELOAD").prefix_separator("__").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
