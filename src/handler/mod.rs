pub mod contract_handler;
pub mod payment_handler;
pub mod project_handler;
pub mod quote_handler;

use bson::oid::ObjectId;

use crate::util::error::HandlerError;

/// Parse a path segment as an ObjectId, mapping failure to a 400.
pub(crate) fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(id).map_err(|_| HandlerError::bad_request(format!("Invalid {} id", what)))
}
