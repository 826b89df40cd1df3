#[tokio::main]
async fn main() {
  if let Err(e) = studio_ops_lib::run().await {
    eprintln!("studio-ops failed: {}", e);
    std::process::exit(1);
  }
}
