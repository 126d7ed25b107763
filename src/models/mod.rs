pub mod recipe;
pub mod shopping_list;
