#[tokio::main]
async fn main() {
    paradisepay_backend::run().await;
}
