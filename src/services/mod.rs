pub mod image;
pub use image::ImageService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogService, ImportSummary};
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{RecipeError, RecipePayload, RecipeService};
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod shopping_list_service;
pub mod shopping_list_service_impl;
pub use shopping_list_service::{ShoppingListError, ShoppingListService};
pub use shopping_list_service_impl::SeaOrmShoppingListService;

pub mod short_link_service;
pub mod short_link_service_impl;
pub use short_link_service::{
    RandomTokenGenerator, ShortLinkError, ShortLinkService, TokenGenerator,
};
pub use short_link_service_impl::SeaOrmShortLinkService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{RegisterRequest, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
