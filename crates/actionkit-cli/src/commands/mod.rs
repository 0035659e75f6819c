pub mod check;
pub mod execute;
pub mod list;

pub use check::CheckCommand;
pub use execute::{ExecuteArgs, ExecuteCommand};
pub use list::ListCommand;
