mod helpers;
mod test_health_api;
mod test_metrics_api;
