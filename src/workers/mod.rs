pub mod metrics_pruner;
pub mod resource_sampler;
