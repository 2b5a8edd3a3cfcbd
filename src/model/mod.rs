pub mod actor;
pub mod contract;
pub mod payment;
pub mod pipeline;
pub mod project;
pub mod quote;
