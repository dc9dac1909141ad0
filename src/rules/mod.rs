pub mod condition;
pub mod context;
pub mod value;

pub use condition::{eval_all, eval_condition, Condition};
pub use context::{ElementArea, MascotSnapshot, WorkArea};
pub use value::{eval_opt, eval_value, EvalError, ValueExpr};
