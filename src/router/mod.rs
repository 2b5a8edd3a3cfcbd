pub mod contract_router;
pub mod payment_router;
pub mod project_router;
pub mod quote_router;
