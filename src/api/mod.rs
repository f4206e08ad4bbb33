pub mod health;
pub mod scan;
pub mod validation;
