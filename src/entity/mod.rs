pub mod customers;
pub mod order_items;
pub mod order_products;
pub mod orders;
pub mod products;

pub use customers::Entity as Customers;
pub use order_items::Entity as OrderItems;
pub use order_products::Entity as OrderProducts;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
