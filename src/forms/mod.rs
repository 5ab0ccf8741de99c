pub mod manager;
pub mod state;
pub mod validator;

pub use manager::{FormManager, InputEvent, SubmitHandler, SubmitOutcome};
pub use state::FormState;
pub use validator::{FieldRule, RuleValidator, Validator};
