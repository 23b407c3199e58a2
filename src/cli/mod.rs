//! CLI command implementations
//!
//! Command parsing and handlers live here rather than in `main.rs` so they
//! can be unit tested.

use crate::{config::ServerConfig, error::Result};

pub mod handlers;
pub use handlers::{Cli, Commands, OutputFormat, WidgetArgs};

/// Main CLI entrypoint - dispatches commands to handlers
///
/// # Errors
///
/// Propagates the handler's error; the binary prints it and exits non-zero.
pub async fn entrypoint(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            model,
            schema,
        } => {
            handlers::handle_serve(ServerConfig {
                host,
                port,
                model_path: model,
                schema_override: schema,
            })
            .await
        },
        Commands::Predict {
            widgets,
            model,
            schema,
            format,
        } => {
            println!("{}", handlers::handle_predict(&widgets, model, schema, format)?);
            Ok(())
        },
        Commands::Schema { format } => {
            println!("{}", handlers::handle_schema(format)?);
            Ok(())
        },
        Commands::DemoModel { output, schema } => {
            println!("{}", handlers::handle_demo_model(&output, schema)?);
            Ok(())
        },
        Commands::Info => {
            print!("{}", handlers::info_text());
            Ok(())
        },
    }
}
