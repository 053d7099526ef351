//! Quire CLI
//!
//! Static site generator with layout templates and a watching dev server.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for quire.
#[derive(Parser)]
#[command(name = "quire", version, about = "A small static site generator")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site into public/
    Build {
        /// Site directory
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Output directory (default: <dir>/public)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Remove the output directory before building
        #[arg(long)]
        clean: bool,
    },
    /// Serve public/ and rebuild on changes
    Serve {
        /// Site directory
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind
        #[arg(long)]
        host: Option<String>,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
        /// Serve without watching for changes
        #[arg(long)]
        no_watch: bool,
    },
    /// Create a new site skeleton
    Init {
        /// Directory to create the site in
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    quire::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { dir, output, clean } => {
            quire::cmd::build::run(&dir, output.as_deref(), clean)?;
        }
        Commands::Serve {
            dir,
            port,
            host,
            open,
            no_watch,
        } => {
            let options = quire::cmd::serve::ServeOptions {
                port,
                host,
                open_browser: open,
                watch: !no_watch,
            };
            quire::cmd::serve::run(&dir, options).await?;
        }
        Commands::Init { dir } => {
            quire::cmd::init::run(&dir)?;
        }
        Commands::Version => {
            println!("quire {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["quire", "build", "site", "--output", "dist"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build { dir, output, clean } => {
                assert_eq!(dir, PathBuf::from("site"));
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(!clean);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_defaults() {
        let cli = Cli::parse_from(["quire", "build", "--clean"]);

        match cli.command {
            Commands::Build { dir, output, clean } => {
                assert_eq!(dir, PathBuf::from("."));
                assert!(output.is_none());
                assert!(clean);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_serve_command_parsing() {
        let args = [
            "quire", "serve", "site", "-p", "4000", "--host", "0.0.0.0", "--open",
        ];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Serve {
                dir,
                port,
                host,
                open,
                no_watch,
            } => {
                assert_eq!(dir, PathBuf::from("site"));
                assert_eq!(port, Some(4000));
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert!(open);
                assert!(!no_watch);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_no_watch() {
        let cli = Cli::parse_from(["quire", "serve", "--no-watch"]);

        match cli.command {
            Commands::Serve { port, no_watch, .. } => {
                assert!(port.is_none());
                assert!(no_watch);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_init_command_parsing() {
        let cli = Cli::parse_from(["quire", "init", "my-site"]);

        match cli.command {
            Commands::Init { dir } => assert_eq!(dir, PathBuf::from("my-site")),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_version_command() {
        let cli = Cli::parse_from(["quire", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["quire", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);

        let cli = Cli::parse_from(["quire", "build", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_rejects_extra_positional() {
        assert!(Cli::try_parse_from(["quire", "build", "a", "b"]).is_err());
    }
}
