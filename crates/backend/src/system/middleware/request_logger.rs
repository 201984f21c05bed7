use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

/// Middleware для логирования HTTP запросов
///
/// Выводит в консоль: timestamp (UTC), длительность (ms), статус код,
/// метод и путь.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    // Голубой для 2xx, коричневый для остальных
    let color_code = if response.status().is_success() {
        "36"
    } else {
        "33"
    };

    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {} {:>6} {}",
        color_code,
        Utc::now().format("%H:%M:%S"),
        duration.as_millis(),
        status,
        method,
        uri.path()
    );

    response
}
