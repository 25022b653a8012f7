// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tollgate - capacity-aware request router for language-model workers.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tollgate_config::TollgateConfig;
use tollgate_session::TokenSigner;

/// Tollgate - capacity-aware request router for language-model workers.
#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP router.
    Serve,
    /// Mint an access token for a user.
    Token {
        /// User id to put in the token subject.
        #[arg(long)]
        subject: String,
        /// Role claim; defaults to `auth.default_role`.
        #[arg(long)]
        role: Option<String>,
    },
    /// Print the effective configuration (secrets omitted).
    Config,
}

fn load_config(path: Option<&PathBuf>) -> TollgateConfig {
    let result = match path {
        Some(path) => tollgate_config::load_and_validate_path(path),
        None => tollgate_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            tollgate_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = tollgate::run_serve(config).await {
                eprintln!("tollgate serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Token { subject, role }) => {
            let role = role.unwrap_or_else(|| config.auth.default_role.clone());
            let issued = TokenSigner::from_config(&config.auth)
                .and_then(|signer| signer.issue(&subject, &role));
            match issued {
                Ok(token) => println!("{token}"),
                Err(e) => {
                    eprintln!("tollgate token: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("tollgate config: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("tollgate: use --help for available commands");
        }
    }
}
