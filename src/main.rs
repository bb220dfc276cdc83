use memory_compare::{App, AppConfig, log_info, util::log};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = AppConfig::load()?;
    log::init(&config.log_dir)?;
    log::init_tracing(&config.log_dir)?;
    log_info!("Comparing memory backends at {}", config.base_url);

    let terminal = ratatui::init();
    let result = App::new(&config).run(terminal).await;
    ratatui::restore();
    result
}
