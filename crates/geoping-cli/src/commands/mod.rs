//! Command implementations.

pub mod add;
pub mod check;
pub mod edit;
pub mod list;
pub mod remove;
pub mod toggle;

pub use self::add::execute_add;
pub use self::check::execute_check;
pub use self::edit::execute_edit;
pub use self::list::execute_list;
pub use self::remove::execute_remove;
pub use self::toggle::execute_toggle;
