use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(alias = "stock")]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    #[serde(alias = "stock")]
    pub stock_quantity: Option<i32>,
    pub image_url: Option<String>,
    pub location: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<Category>,
}
