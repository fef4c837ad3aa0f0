pub mod combinations;
pub mod options;
pub mod orchestrator;
pub mod pricing;
pub mod resolver;

pub use crate::domain::model::{
    ConfigurationField, ConfigurationRequest, ItemOption, OptionCandidate, OrderRequest,
    PriceConfig,
};
pub use crate::domain::ports::{OrderService, Prompt};
pub use crate::utils::error::Result;
