use clap::Parser;
use scanner_cli::{bootstrap, handlers, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve { port } => handlers::serve::execute(port).await,
        Commands::Scan {
            service_url,
            username,
            password,
            git_url,
        } => {
            let ctx = bootstrap();
            handlers::scan::execute(&ctx, &service_url, &username, &password, &git_url).await
        }
        Commands::Cleanup => handlers::cleanup::execute().await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
