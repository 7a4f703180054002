pub mod collection;
pub mod follow;
pub mod rating;
pub mod recipe;
pub mod saved_recipe;
pub mod user;

pub use collection::*;
pub use follow::*;
pub use rating::*;
pub use recipe::*;
pub use saved_recipe::*;
pub use user::*;
