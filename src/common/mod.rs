// Shared constants, helpers and input validation
pub mod constants;
pub mod utils;
pub mod validation;
