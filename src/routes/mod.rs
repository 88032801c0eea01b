mod error;
mod health_check;
mod jobs;
mod register;
mod users;

pub use error::ApiError;
pub use health_check::health_check;
pub use jobs::handle_list_jobs;
pub use register::handle_register;
pub use users::{handle_delete_user, handle_get_user, handle_list_users, handle_notify_user};
