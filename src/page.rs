use axum::response::Html;

/// GET / — the single-page chat client, embedded at compile time.
/// Presentation only: name prompt, message list, input box. All join/leave
/// and message semantics live server-side in the session registry.
pub async fn chat_page() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}
