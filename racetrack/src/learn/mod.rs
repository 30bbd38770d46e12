pub mod cancellation;
pub mod evaluator;
pub mod session;
pub mod trainer;
