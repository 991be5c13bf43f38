use macrodb::config::Settings;
use macrodb::server;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // optional first argument: path of the settings file
    let path = std::env::args().nth(1);
    let settings = match Settings::load(path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Err(e) = server::serve(settings).await {
        error!(%e, "server stopped");
        std::process::exit(1);
    }
}
