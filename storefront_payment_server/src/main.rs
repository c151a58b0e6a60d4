use dotenvy::dotenv;
use log::info;
use storefront_payment_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        // Help was printed; nothing to serve.
        return;
    }
    let config = ServerConfig::from_env_or_default();

    info!("🚀️ Storefront payment gateway listening on {}:{}", config.host, config.port);
    if let Err(e) = run_server(config).await {
        eprintln!("The server did not shut down cleanly. {e}");
        std::process::exit(1);
    }
}
