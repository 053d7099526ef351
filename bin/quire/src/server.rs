//! Static file server for the generated site

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

/// Create the development server router.
///
/// Every request is answered from `output_dir`; directory requests fall back
/// to their `index.html`.
pub fn create_router(output_dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(output_dir).append_index_html_on_directories(true))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    use super::*;

    async fn get(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_output_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("index.html"), "<main>home</main>").unwrap();
        fs::write(dir.path().join("blog/index.html"), "<main>blog</main>").unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(dir.path());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let home = get(addr, "/").await;
        assert!(home.starts_with("HTTP/1.1 200"));
        assert!(home.contains("<main>home</main>"));

        let blog = get(addr, "/blog/").await;
        assert!(blog.contains("<main>blog</main>"));

        let missing = get(addr, "/nope.html").await;
        assert!(missing.starts_with("HTTP/1.1 404"));
    }
}
