use log::info;
use todoable_mock_server::Credentials;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = Credentials::default();
    let credentials = Credentials {
        username: std::env::var("TODOABLE_USER").unwrap_or(defaults.username),
        password: std::env::var("TODOABLE_PASSWORD").unwrap_or(defaults.password),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr} (user {})", credentials.username);
    todoable_mock_server::run(listener, credentials).await
}
