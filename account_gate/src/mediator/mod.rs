mod credential;
mod errors;
mod forms;
mod outcome;

pub use credential::CredentialMediator;
pub use errors::{MediatorError, ModelError};
pub use forms::{ConfirmForm, LoginForm, SignupForm};
pub use outcome::{Outcome, RedirectTarget};
