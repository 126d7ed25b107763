pub mod catalog;
pub mod collection;
pub mod recipe;
pub mod short_link;
pub mod subscription;
pub mod user;
