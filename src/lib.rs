pub mod auth;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod services;

#[cfg(test)]
pub mod test_support;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup_customer,
        handlers::auth::signup_restaurant,
        handlers::auth::change_password,
        handlers::customers::get_profile,
        handlers::customers::update_profile,
        handlers::customers::list_favorites,
        handlers::customers::add_favorite,
        handlers::customers::remove_favorite,
        handlers::carts::add_to_cart,
        handlers::carts::list_carts,
        handlers::carts::get_cart,
        handlers::carts::update_cart_item,
        handlers::carts::delete_cart,
        handlers::carts::delete_cart_item,
        handlers::catalog::search,
        handlers::catalog::get_restaurant,
        handlers::catalog::menu_items,
        handlers::catalog::menu_item_detail,
        handlers::catalog::my_restaurant,
        handlers::catalog::update_my_restaurant,
        handlers::catalog::list_my_items,
        handlers::catalog::create_item,
        handlers::catalog::get_my_item,
        handlers::catalog::update_my_item,
        handlers::catalog::delete_my_item,
        handlers::orders::list_orders,
        handlers::orders::create_order,
        handlers::orders::order_history,
        handlers::orders::restaurant_orders,
        handlers::orders::update_order_status,
        handlers::reviews::create_review,
        handlers::reviews::item_reviews,
        handlers::reports::sales_report,
    ),
    components(schemas(
        handlers::auth::CustomerSignUpRequest,
        handlers::auth::RestaurantSignUpRequest,
        handlers::auth::SignUpResponse,
        handlers::auth::PasswordChangeRequest,
        handlers::customers::NestedUserResponse,
        handlers::customers::CustomerProfileResponse,
        handlers::customers::NestedUserUpdate,
        handlers::customers::CustomerProfileUpdateRequest,
        handlers::customers::FavoriteResponse,
        handlers::customers::AddFavoriteRequest,
        handlers::carts::AddToCartRequest,
        handlers::carts::UpdateCartItemRequest,
        handlers::carts::CartItemResponse,
        handlers::carts::CartResponse,
        handlers::catalog::RestaurantResponse,
        handlers::catalog::ItemResponse,
        handlers::catalog::SearchResponse,
        handlers::catalog::RestaurantUpdateRequest,
        handlers::catalog::ItemCreateRequest,
        handlers::catalog::ItemUpdateRequest,
        handlers::orders::CreateOrderRequest,
        handlers::orders::OrderStatusUpdateRequest,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderResponse,
        handlers::reviews::CreateReviewRequest,
        handlers::reviews::ReviewResponse,
        handlers::reviews::ItemReviewResponse,
        handlers::reports::SalesReportItemResponse,
        handlers::reports::SalesReportResponse,
    )),
    tags(
        (name = "auth", description = "Signup and password management"),
        (name = "customer", description = "Customer profile and favorites"),
        (name = "carts", description = "Shopping carts"),
        (name = "catalog", description = "Public restaurant and menu reads"),
        (name = "restaurant", description = "Restaurant manager surface"),
        (name = "orders", description = "Order placement and lifecycle"),
        (name = "reviews", description = "Order reviews"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(Logger::default())
            .service(
                web::scope("/api/auth")
                    .route(
                        "/signup/customer",
                        web::post().to(handlers::auth::signup_customer),
                    )
                    .route(
                        "/signup/restaurant",
                        web::post().to(handlers::auth::signup_restaurant),
                    )
                    .route("/password", web::post().to(handlers::auth::change_password)),
            )
            .service(
                web::scope("/api/customer")
                    .route("/profile", web::get().to(handlers::customers::get_profile))
                    .route("/profile", web::put().to(handlers::customers::update_profile))
                    .route(
                        "/favorites",
                        web::get().to(handlers::customers::list_favorites),
                    )
                    .route(
                        "/favorites",
                        web::post().to(handlers::customers::add_favorite),
                    )
                    .route(
                        "/favorites",
                        web::delete().to(handlers::customers::remove_favorite),
                    )
                    .route("/carts", web::post().to(handlers::carts::add_to_cart))
                    .route("/carts", web::get().to(handlers::carts::list_carts))
                    .route("/carts/{id}", web::get().to(handlers::carts::get_cart))
                    .route(
                        "/carts/{id}",
                        web::put().to(handlers::carts::update_cart_item),
                    )
                    .route("/carts/{id}", web::delete().to(handlers::carts::delete_cart))
                    .route(
                        "/carts/{id}/items/{cart_item_id}",
                        web::delete().to(handlers::carts::delete_cart_item),
                    )
                    .route(
                        "/restaurants/{restaurant_id}/items",
                        web::get().to(handlers::catalog::menu_items),
                    )
                    .route(
                        "/restaurants/{restaurant_id}/items/{item_id}",
                        web::get().to(handlers::catalog::menu_item_detail),
                    )
                    .route("/orders", web::get().to(handlers::orders::list_orders))
                    .route("/orders", web::post().to(handlers::orders::create_order))
                    .route(
                        "/orders/history",
                        web::get().to(handlers::orders::order_history),
                    )
                    .route(
                        "/reviews/create",
                        web::post().to(handlers::reviews::create_review),
                    )
                    .route(
                        "/items/{item_id}/reviews",
                        web::get().to(handlers::reviews::item_reviews),
                    ),
            )
            .service(
                web::scope("/api/restaurant")
                    .route("/profiles", web::get().to(handlers::catalog::search))
                    .route(
                        "/profiles/me",
                        web::get().to(handlers::catalog::my_restaurant),
                    )
                    .route(
                        "/profiles/me",
                        web::put().to(handlers::catalog::update_my_restaurant),
                    )
                    .route(
                        "/profiles/{id}",
                        web::get().to(handlers::catalog::get_restaurant),
                    )
                    .route("/items", web::get().to(handlers::catalog::list_my_items))
                    .route("/items", web::post().to(handlers::catalog::create_item))
                    .route("/items/{id}", web::get().to(handlers::catalog::get_my_item))
                    .route(
                        "/items/{id}",
                        web::put().to(handlers::catalog::update_my_item),
                    )
                    .route(
                        "/items/{id}",
                        web::delete().to(handlers::catalog::delete_my_item),
                    )
                    .route(
                        "/orders",
                        web::get().to(handlers::orders::restaurant_orders),
                    )
                    .route(
                        "/orders/{id}/status",
                        web::patch().to(handlers::orders::update_order_status),
                    )
                    .route(
                        "/sales-reports",
                        web::get().to(handlers::reports::sales_report),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
