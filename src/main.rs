use xcord::{cli, logging};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let guard = logging::init_logging(args.log_level.as_deref());

    if let Err(e) = xcord::run(args).await {
        tracing::error!("XCord stopped: {}", e);
        drop(guard);
        std::process::exit(1);
    }
}
