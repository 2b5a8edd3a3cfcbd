pub mod contract_service;
pub mod payment_service;
pub mod project_service;
pub mod quote_service;
