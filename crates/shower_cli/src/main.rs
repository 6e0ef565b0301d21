#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = lib_shower_cli::init().await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
