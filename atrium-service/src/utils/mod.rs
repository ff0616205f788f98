pub mod password;
pub mod validation;
