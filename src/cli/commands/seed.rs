use clap::Args;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::models::{NewProduct, NewUser};
use crate::database::{DatabaseManager, PgProductStore, PgUserStore, UserStore};

pub const DEMO_PASSWORD: &str = "Password123!";

const DEMO_USERS: &[(&str, &str, &str, &str)] = &[
    ("John", "Doe", "john.doe@example.com", "+1234567890"),
    ("Jane", "Smith", "jane.smith@example.com", "+1234567891"),
    ("Admin", "User", "admin@example.com", "+1234567892"),
];

const DEMO_CATEGORIES: &[(&str, &str)] = &[
    ("Electronics", "Gadgets, devices and electronic accessories"),
    ("Clothing", "Apparel, footwear and fashion items"),
    ("Home & Kitchen", "Furniture, appliances and decor"),
    ("Books", "Educational material, fiction and non-fiction"),
    ("Sports & Outdoors", "Gym equipment, sports gear and outdoor supplies"),
];

const ADJECTIVES: &[&str] = &["Premium", "Deluxe", "Smart", "Elite", "Basic", "Ultra", "Eco", "Advanced", "Modern", "Classic"];
const NOUNS: &[&str] = &["Product", "Device", "Item", "Gadget", "Tool", "Essential", "Unit", "Model", "Series", "X"];

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long, help = "Number of demo products", default_value = "100")]
    pub products: u32,

    #[arg(long, help = "Random seed; the same seed yields the same catalog", default_value = "42")]
    pub seed: u64,

    #[arg(long, help = "Skip demo users")]
    pub skip_users: bool,
}

pub async fn handle(args: SeedArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = DatabaseManager::connect_lazy(&config.database)?;
    let users = PgUserStore::new(db.pool().clone());
    let products = PgProductStore::new(db.pool().clone());

    let mut users_created = 0;
    if !args.skip_users {
        let password_hash = hash_password(DEMO_PASSWORD, None).await?;
        for (first_name, last_name, email, phone) in DEMO_USERS {
            if users.email_exists(email).await? {
                continue;
            }
            users
                .create(NewUser {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: email.to_string(),
                    password_hash: password_hash.clone(),
                    phone_number: Some(phone.to_string()),
                    avatar: None,
                })
                .await?;
            users_created += 1;
        }
    }

    let mut category_ids = Vec::with_capacity(DEMO_CATEGORIES.len());
    for (name, description) in DEMO_CATEGORIES {
        category_ids.push(products.upsert_category(name, description).await?);
    }

    let mut products_created = 0;
    for product in demo_products(&category_ids, args.products, args.seed) {
        if products.insert_product(&product).await? {
            products_created += 1;
        }
    }

    let categories = products.categories().await?.len();
    db.close().await;

    tracing::info!(users_created, categories, products_created, "seed complete");
    output_success(
        output_format,
        &format!(
            "Seeded {} users, {} categories, {} products",
            users_created, categories, products_created
        ),
        Some(json!({
            "users": users_created,
            "categories": categories,
            "products": products_created,
        })),
    )
}

/// Deterministic demo catalog. SKUs are `PROD-<category prefix>-<1000 + n>`.
pub fn demo_products(category_ids: &[Uuid], count: u32, seed: u64) -> Vec<NewProduct> {
    if category_ids.is_empty() {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    (1..=count)
        .map(|i| {
            let category_id = category_ids[rng.random_range(0..category_ids.len())];
            let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
            let noun = NOUNS[rng.random_range(0..NOUNS.len())];
            let name = format!("{} {} {}", adjective, noun, i);
            let prefix: String = category_id.simple().to_string().chars().take(4).collect();

            NewProduct {
                category_id,
                description: Some(format!(
                    "Detailed description for {}. This is a high-quality product designed for daily use.",
                    name
                )),
                name,
                price: Decimal::new(rng.random_range(1_000..50_000), 2),
                stock_quantity: rng.random_range(1..=200),
                sku: format!("PROD-{}-{}", prefix, 1000 + i),
                image_url: Some(format!("https://picsum.photos/600/400?random={}", i)),
            }
        })
        .collect()
}
