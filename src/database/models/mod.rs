pub mod category;
pub mod product;
pub mod user;

pub use category::ProductCategory;
pub use product::{NewProduct, Product, ProductListItem};
pub use user::{NewUser, User};
