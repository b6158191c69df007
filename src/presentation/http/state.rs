use crate::infrastructure::monitoring::MonitoringService;

#[derive(Clone)]
pub struct AppState {
    pub monitoring: MonitoringService,
}
