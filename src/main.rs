use clap::Parser;
use filevault::cli::commands::{decrypt::DecryptArgs, encrypt::EncryptArgs};
use filevault::cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr, filtered by `FILEVAULT_LOG` (default: warn).
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_env("FILEVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let result = match cli.command {
        Commands::Init => filevault::cli::commands::init::execute(&cli),
        Commands::Encrypt {
            ref paths,
            ref output_dir,
            shred,
            generate_password,
            argon2,
        } => filevault::cli::commands::encrypt::execute(
            &cli,
            &EncryptArgs {
                paths,
                output_dir: output_dir.as_ref(),
                shred,
                generate_password,
                argon2,
            },
        ),
        Commands::Decrypt {
            ref target,
            name,
            ref version,
            preview,
            ref output_dir,
        } => filevault::cli::commands::decrypt::execute(
            &cli,
            &DecryptArgs {
                target,
                by_name: name,
                version: version.as_deref(),
                preview,
                output_dir: output_dir.as_ref(),
            },
        ),
        Commands::Search { ref name, json } => {
            filevault::cli::commands::search::execute(&cli, name, json)
        }
        Commands::List => filevault::cli::commands::list::execute(&cli),
        Commands::GeneratePassword { length, copy } => {
            filevault::cli::commands::generate_password::execute(&cli, length, copy)
        }
        Commands::Audit { last } => filevault::cli::commands::audit_cmd::execute(&cli, last),
        Commands::Completions { ref shell } => {
            filevault::cli::commands::completions::execute(shell)
        }
        Commands::Version => filevault::cli::commands::version::execute(),
    };

    if let Err(e) = result {
        filevault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
