// Topic map core: the record model, validation, the session-held table and its
// delimited-text exchange format, plus the HTTP handlers over them.

pub mod delimited;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod record;
pub mod session;
pub mod table;
pub mod validation;
