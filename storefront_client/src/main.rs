use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use qrcode::{render::unicode, QrCode};
use storefront_client::{
    countdown::{format_remaining, PaymentCountdown},
    poller::{await_payment, PaymentWaitOutcome, StatusPoller},
    StorefrontClient,
};
use storefront_payment_server::data_objects::CheckoutRequest;
use url::Url;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Arguments {
    /// Gateway base URL. Falls back to SPG_SERVER_URL, then localhost.
    #[arg(short, long)]
    server: Option<Url>,
    /// Session token. Falls back to SPG_ACCESS_TOKEN.
    #[arg(short, long)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange a Google credential for a session token
    #[clap(name = "login")]
    Login {
        /// The Google ID token obtained from the sign-in widget
        credential: String,
    },
    /// Submit a checkout form (JSON file) and create an order
    #[clap(name = "checkout")]
    Checkout(CheckoutParams),
    /// Show payment instructions for an order and wait for the transfer to be confirmed
    #[clap(name = "pay")]
    Pay {
        /// The order number, e.g. ORD-000123
        order_code: String,
    },
    /// Show the payment status summary for an order
    #[clap(name = "status")]
    Status { order_code: String },
    /// List your orders
    #[clap(name = "orders")]
    Orders(OrdersParams),
    /// Show one order in full
    #[clap(name = "order")]
    Order { id: i64 },
    /// Show the carrier tracking timeline for an order
    #[clap(name = "track")]
    Track { id: i64 },
}

#[derive(Debug, Args)]
pub struct CheckoutParams {
    /// Path to a JSON file holding the checkout form (items, shippingAddress, paymentMethod)
    #[arg(short, long)]
    file: PathBuf,
}

#[derive(Debug, Args)]
pub struct OrdersParams {
    #[arg(short, long, default_value = "1")]
    page: i64,
    #[arg(short, long, default_value = "10")]
    limit: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();

    let base = match cli.server {
        Some(url) => url,
        None => std::env::var("SPG_SERVER_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8470".to_string())
            .parse::<Url>()
            .map_err(|e| anyhow!("Invalid server URL: {e}"))?,
    };
    let token = cli.token.or_else(|| std::env::var("SPG_ACCESS_TOKEN").ok()).unwrap_or_default();
    let mut client = StorefrontClient::new(base).with_token(token);

    match cli.command {
        Command::Login { credential } => {
            let login = client.login_with_google(&credential).await?;
            println!("Logged in as {} <{}>", login.user.username, login.user.email);
            println!("Export this for subsequent commands:");
            println!("  SPG_ACCESS_TOKEN={}", login.token);
        },
        Command::Checkout(params) => {
            let form = std::fs::read_to_string(&params.file)?;
            let request: CheckoutRequest = serde_json::from_str(&form)?;
            let order = client.checkout(&request).await?;
            println!("Order {} created. Total: {}", order.order_number, order.total);
            if order.payment_method.is_transfer() {
                println!("Run `storefront_client pay {}` to complete payment.", order.order_number);
            }
        },
        Command::Pay { order_code } => pay(&client, &order_code).await?,
        Command::Status { order_code } => {
            let summary = client.order_status(&order_code).await?;
            println!("Order {order_code}: {} / payment {}", summary.status, summary.payment_status);
        },
        Command::Orders(params) => {
            let page = client.my_orders(params.page, params.limit).await?;
            println!("Orders (page {} of {} total):", page.page, page.total);
            for order in &page.orders {
                println!(
                    "  {}  {:>12}  {:<10} payment: {}",
                    order.order_number, order.total.to_string(), order.status.to_string(), order.payment_status
                );
            }
        },
        Command::Order { id } => {
            let detail = client.order_detail(id).await?;
            println!("Order {} ({})", detail.order.order_number, detail.order.status);
            for item in &detail.items {
                println!("  {} x{} @ {} = {}", item.product_name, item.quantity, item.unit_price, item.subtotal);
            }
            println!("  Subtotal: {}", detail.order.subtotal);
            println!("  Shipping: {}", detail.order.shipping_fee);
            println!("  Total:    {}", detail.order.total);
        },
        Command::Track { id } => {
            let report = client.tracking(id).await?;
            println!("Current: {} at {}", report.current_status, report.current_station);
            if let Some(next) = &report.next_station {
                println!("Next:    {next}");
            }
            for event in &report.timeline {
                println!("  {}  {:<12} {} ({})", event.time, event.status, event.description, event.station);
            }
        },
    }
    Ok(())
}

/// The checkout waiting flow: show the transfer instructions and QR code, then race the status poller against
/// the countdown. Ctrl-C plays the part of navigating away and cancels the poller explicitly.
async fn pay(client: &StorefrontClient, order_code: &str) -> Result<()> {
    let info = client.payment_info(order_code).await?;
    println!("Transfer {} with reference '{}'", info.amount, info.payment_ref);
    println!("Instructions expire at {}", info.expired_at);
    println!("{}", render_qr(&info.qr_url));

    let poller = StatusPoller::new(client.clone());
    let cancel = poller.cancellation_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel.cancel();
    });
    let countdown = PaymentCountdown::until(info.expired_at);
    let outcome = await_payment(&poller, &countdown, order_code, |remaining| {
        print!("\r⏳ {}  ", format_remaining(remaining));
        std::io::stdout().flush().ok();
    })
    .await;
    println!();
    match outcome {
        PaymentWaitOutcome::Confirmed(_) => {
            println!("✅ Payment received. Thank you!");
            // The storefront redirects to the order list shortly after confirmation; do the same here
            tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
            let page = client.my_orders(1, 10).await?;
            for order in &page.orders {
                println!("  {}  {:>12}  payment: {}", order.order_number, order.total.to_string(), order.payment_status);
            }
        },
        PaymentWaitOutcome::Expired => {
            println!("⌛ The payment window has expired. The order will be cancelled shortly.");
        },
        PaymentWaitOutcome::Cancelled => {
            println!("Stopped waiting. The order stays pending until the window expires.");
        },
    }
    Ok(())
}

fn render_qr(link: &str) -> String {
    QrCode::new(link)
        .map(|code| {
            code.render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Dark)
                .light_color(unicode::Dense1x2::Light)
                .quiet_zone(false)
                .build()
        })
        .unwrap_or_default()
}
