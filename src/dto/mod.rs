pub mod contract_dto;
pub mod payment_dto;
pub mod quote_dto;
