//! String-expression sub-languages: key conditions, filter/update conditions,
//! update actions, and projections, all built on the shared tokenizer and
//! `#name`/`:value` alias resolution in [`lexer`]/[`names`].

mod condition;
mod key_condition;
mod lexer;
mod names;
mod projection;
mod update;

pub use condition::parse_condition;
pub use key_condition::parse_key_condition;
pub use names::{ExpressionNames, ExpressionValues};
pub use projection::{apply_projection, parse_projection};
pub use update::parse_update;
