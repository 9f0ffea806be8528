use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::{ChartRenderer, Console, ReportAssembler, SvgBarChart};
use crate::db::Catalog;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn Catalog>,
    pub reports: Arc<ReportAssembler>,
    pub console: Arc<Console>,
}

impl AppContext {
    pub fn new(config: AppConfig, catalog: Arc<dyn Catalog>) -> Self {
        let charts: Arc<dyn ChartRenderer> = Arc::new(SvgBarChart::default());
        let console = Console::new(config.console.clone());
        Self {
            reports: Arc::new(ReportAssembler::new(catalog.clone(), charts)),
            config: Arc::new(config),
            catalog,
            console: Arc::new(console),
        }
    }
}
