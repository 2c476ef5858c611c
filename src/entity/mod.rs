pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod feedback;
pub mod order_items;
pub mod orders;
pub mod product_categories;
pub mod products;
pub mod revoked_tokens;
pub mod stores;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use feedback::Entity as Feedback;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_categories::Entity as ProductCategories;
pub use products::Entity as Products;
pub use revoked_tokens::Entity as RevokedTokens;
pub use stores::Entity as Stores;
pub use users::Entity as Users;
