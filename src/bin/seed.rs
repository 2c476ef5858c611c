use chrono::{Duration, Utc};
use marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::Role,
        categories::{CategoryRequest, ProductCategoriesRequest},
        products::CreateProductRequest,
        stores::RegisterStoreRequest,
        users::RegisterUserRequest,
    },
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{Column as ProductCol, Entity as Products},
        stores::{Column as StoreCol, Entity as Stores},
        users::{Column as UserCol, Entity as Users},
    },
    middleware::auth::AuthUser,
    services::{category_service, product_service, store_service, user_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

const STORE_EMAIL: &str = "store@example.com";
const USER_EMAIL: &str = "user@example.com";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let state = AppState::new(orm, &config);

    let store_id = ensure_store(&state).await?;
    let user_id = ensure_user(&state).await?;
    seed_catalog(&state, store_id).await?;

    println!("Seed completed. Store ID: {store_id}, User ID: {user_id}");
    Ok(())
}

fn acting_as(id: Uuid, role: Role) -> AuthUser {
    AuthUser {
        id,
        role,
        jti: Uuid::new_v4(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

async fn ensure_store(state: &AppState) -> anyhow::Result<Uuid> {
    if let Some(store) = Stores::find()
        .filter(StoreCol::Email.eq(STORE_EMAIL))
        .one(&state.orm)
        .await?
    {
        return Ok(store.id);
    }

    let resp = store_service::register(
        state,
        RegisterStoreRequest {
            seller_full_name: "Ferris Crab".into(),
            username: "ferris".into(),
            email: STORE_EMAIL.into(),
            password: "store123".into(),
            store_name: "Ferris Goods".into(),
            description: "Merch for Rustaceans".into(),
            image_url: "https://example.com/store.png".into(),
            bank_account: "0011223344".into(),
            contact_number: "+620000000".into(),
            address: "1 Harbor Road".into(),
            city: "Jakarta".into(),
            state: "DKI Jakarta".into(),
            zip_code: "10110".into(),
        },
    )
    .await?;
    let id = resp.data.map(|s| s.id).ok_or_else(|| anyhow::anyhow!("store not returned"))?;
    println!("Ensured store {STORE_EMAIL}");
    Ok(id)
}

async fn ensure_user(state: &AppState) -> anyhow::Result<Uuid> {
    if let Some(user) = Users::find()
        .filter(UserCol::Email.eq(USER_EMAIL))
        .one(&state.orm)
        .await?
    {
        return Ok(user.id);
    }

    let resp = user_service::register(
        state,
        RegisterUserRequest {
            username: "shopper".into(),
            email: USER_EMAIL.into(),
            password: "user123".into(),
            first_name: "Sam".into(),
            last_name: "Shopper".into(),
            address: "2 Market Street".into(),
            city: "Bandung".into(),
            state: "West Java".into(),
            zip_code: "40111".into(),
            image_url: "https://example.com/user.png".into(),
        },
    )
    .await?;
    let id = resp.data.map(|u| u.id).ok_or_else(|| anyhow::anyhow!("user not returned"))?;
    println!("Ensured user {USER_EMAIL}");
    Ok(id)
}

async fn seed_catalog(state: &AppState, store_id: Uuid) -> anyhow::Result<()> {
    let store = acting_as(store_id, Role::Store);

    let category_id = match Categories::find()
        .filter(CategoryCol::StoreId.eq(store_id))
        .filter(CategoryCol::Name.eq("Apparel"))
        .one(&state.orm)
        .await?
    {
        Some(category) => category.id,
        None => category_service::create_category(
            state,
            &store,
            CategoryRequest {
                name: "Apparel".into(),
                description: Some("Things to wear".into()),
            },
        )
        .await?
        .data
        .map(|c| c.id)
        .ok_or_else(|| anyhow::anyhow!("category not returned"))?,
    };

    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550_000, 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120_000, 100),
        ("Rust Sticker Pack", "Decorate your laptop", 50_000, 200),
    ];

    for (name, desc, price, stock) in products {
        let exists = Products::find()
            .filter(ProductCol::StoreId.eq(store_id))
            .filter(ProductCol::Name.eq(name))
            .one(&state.orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let product = product_service::create_product(
            state,
            &store,
            CreateProductRequest {
                name: name.into(),
                description: Some(desc.into()),
                price,
                stock_quantity: stock,
                image_url: None,
                location: Some("Jakarta".into()),
            },
        )
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("product not returned"))?;

        if name == "Axum Hoodie" {
            category_service::add_product_categories(
                state,
                &store,
                product.id,
                ProductCategoriesRequest {
                    category_ids: vec![category_id],
                },
            )
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}
