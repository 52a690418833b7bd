use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateProductPayload {
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockPayload {
    pub updated_products: Vec<Product>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub is_in_stock: bool,
    pub is_out_of_stock: bool,
    pub is_low_stock: bool,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            is_in_stock: product.is_in_stock(),
            is_out_of_stock: product.is_out_of_stock(),
            is_low_stock: product.is_low_stock(),
            product,
        }
    }
}
