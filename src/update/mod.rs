mod executor;
mod expression;

pub use executor::UpdateExecutor;
pub use expression::{Operand, SetValue, UpdateAction, UpdateExpression};
