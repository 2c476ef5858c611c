use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem};

pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    pub shipping_address: Option<String>,
}

impl Default for CheckoutRequest {
    fn default() -> Self {
        Self {
            payment_method: default_payment_method(),
            shipping_address: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
