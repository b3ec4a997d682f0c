//! Command handlers - extracted from main.rs for testability

pub mod inspect;
pub mod run;
pub mod validate;

pub use inspect::execute_inspect;
pub use run::execute_run;
pub use validate::execute_validate;
