#[tokio::main]
async fn main() {
    let exit_code = swt_release_fetcher_lib::run().await;
    std::process::exit(exit_code);
}
