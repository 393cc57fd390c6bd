use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
/// The chat page. All state lives server-side; the page only talks to the JSON API.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
