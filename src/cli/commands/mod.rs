mod import;
mod init;
mod user;

pub use import::{cmd_import_ingredients, cmd_import_tags};
pub use init::cmd_init;
pub use user::cmd_create_user;
