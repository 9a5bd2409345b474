mod cancel;
mod vars;

pub mod prelude {
    pub use crate::cancel::{CancelHandle, CancelListener};
    pub use crate::vars::{VariableResolver, CWD_TOKEN, PID_TOKEN};
}
