//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, circulation, health, members};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lendly API",
        version = "0.1.0",
        description = "Library circulation REST API. Successful responses wrap the \
                       documented body in `{success, message?, count?, data}`.",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::add_book,
        books::update_book,
        books::delete_book,
        books::list_borrowed,
        // Members
        members::list_members,
        members::get_member,
        members::register_member,
        members::get_member_borrowed,
        // Circulation
        circulation::borrow_book,
        circulation::return_book,
        circulation::list_overdue,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::member::Member,
            crate::models::member::CreateMember,
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowRequest,
            crate::models::borrow::ReturnRequest,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "members", description = "Member registration"),
        (name = "circulation", description = "Borrowing, returns and overdue loans")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
