#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cuesight_lib::run().await
}
