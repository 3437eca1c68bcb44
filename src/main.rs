use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{error, info};

use ftp_gateway::{Config, DirectoryView, Gateway, Identity};

/// Browse and manage a remote FTP server one request at a time.
#[derive(Debug, Parser)]
#[command(name = "ftp-gateway", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log in as this user before running the command
    #[arg(short, long)]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long, env = "FTP_GATEWAY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List a remote directory
    List {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Check the administrator credentials against the server
    Login,
    /// Delete a remote file or empty directory
    Delete {
        item_path: String,
        /// "file" or "dir"
        item_type: String,
    },
    /// Upload a local file into a remote directory
    Upload {
        local_file: PathBuf,
        #[arg(default_value = ".")]
        remote_dir: String,
    },
    /// Create a directory inside a remote directory
    Mkdir {
        name: String,
        #[arg(default_value = ".")]
        remote_dir: String,
    },
    /// Download a remote file
    Download {
        remote_file: String,
        /// Where to write the file; defaults to its remote name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(buf, "[{}] [{}] {}", timestamp, record.level(), record.args())
        })
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let config = match args.config {
        Some(ref path) => Config::load(path).context("Failed to load configuration")?,
        None => Config::default(),
    };
    config.log();

    let gateway = Gateway::from_config(&config);
    let identity = match args.user {
        Some(ref user) => {
            let password = args.password.as_deref().unwrap_or_default();
            gateway
                .login(user, password)
                .with_context(|| format!("Login failed for user '{}'", user))?
        }
        None => Identity::Anonymous,
    };

    match args.command {
        Command::List { path } => {
            let view = gateway.list(&identity, &path)?;
            print_view(&view)?;
            if let Some(err) = view.error {
                bail!("Error listing files: {}", err);
            }
        }
        Command::Login => {
            if identity.is_anonymous() {
                bail!("--user is required to log in");
            }
            info!("Welcome, Admin! You are logged in.");
        }
        Command::Delete { item_path, item_type } => {
            let deleted = gateway.delete(&identity, &item_path, &item_type)?;
            info!("{}", deleted);
        }
        Command::Upload { local_file, remote_dir } => {
            let file_name = local_file
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from)
                .with_context(|| format!("Not a file: {}", local_file.display()))?;
            let mut file = File::open(&local_file)
                .with_context(|| format!("Failed to open {}", local_file.display()))?;
            let uploaded = gateway.upload(&identity, &remote_dir, &file_name, &mut file)?;
            info!("{}", uploaded);
        }
        Command::Mkdir { name, remote_dir } => {
            let created = gateway.mkdir(&identity, &remote_dir, &name)?;
            info!("{}", created);
        }
        Command::Download { remote_file, output } => {
            let mut staged = gateway.download(&identity, &remote_file)?;
            let output = output.unwrap_or_else(|| PathBuf::from(staged.name()));
            let mut out = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let written = staged.copy_to(&mut out)?;
            staged.remove();
            info!("Downloaded {} ({} bytes) to {}", remote_file, written, output.display());
        }
    }

    gateway.logout(identity);
    Ok(())
}

fn print_view(view: &DirectoryView) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let trail: Vec<&str> = view.breadcrumbs.iter().map(|b| b.name.as_str()).collect();
    writeln!(out, "/{}", trail.join("/"))?;
    if let Some(ref parent) = view.parent {
        writeln!(out, "  up: {}", parent)?;
    }
    for entry in &view.entries {
        let marker = if entry.is_dir() { "d" } else { "-" };
        writeln!(out, "{} {:>10} {:<20} {}", marker, entry.human_size, entry.modified_at, entry.name)?;
    }
    Ok(())
}
