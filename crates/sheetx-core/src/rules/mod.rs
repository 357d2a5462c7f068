pub mod syntax;
pub mod validation;

pub use validation::OperationValidator;
