use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use caskr::config::Config;
use caskr::feed::GitHubFeed;
use caskr::installer::MacOsInstaller;
use caskr::lifecycle::{InstallAction, LivecheckAction, UninstallAction, ZapAction};
use caskr::manifest::Manifest;
use caskr::runtime::{RealRuntime, Runtime};

/// caskr - declarative package lifecycle runner
///
/// Executes the install / uninstall / zap / livecheck lifecycle declared
/// by a package manifest (JSON).
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for
/// livecheck authentication. This is useful for private repositories or
/// avoiding rate limits.
///
/// Examples:
///   caskr install cassh.json     # Download, verify, and install
///   caskr livecheck cassh.json   # Check for a newer upstream release
#[derive(Parser, Debug)]
#[command(author, version = env!("CASKR_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Release feed API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, verify, and install the package a manifest describes
    Install(ManifestArgs),

    /// Remove the installed package (service, receipt, application)
    Uninstall(ManifestArgs),

    /// Uninstall, then purge the user state listed in the manifest's zap paths
    Zap(ZapArgs),

    /// Check the upstream release feed for a newer version
    Livecheck(ManifestArgs),

    /// Print the descriptor summary and caveats
    Show(ManifestArgs),
}

#[derive(clap::Args, Debug)]
struct ManifestArgs {
    /// Path to the package manifest
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ZapArgs {
    /// Path to the package manifest
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Install(args) => {
            let manifest = Manifest::load(&runtime, &args.manifest)?;
            let config = Config::new(cli.api_url)?;
            let installer = MacOsInstaller::new(!runtime.is_privileged());

            InstallAction::new(&runtime, &installer, &config.http_client)
                .run(&manifest)
                .await?;

            println!("{} installed.", manifest.display_name());
            if let Some(caveats) = &manifest.caveats {
                println!("\n{}", caveats.trim_end());
            }
        }
        Commands::Uninstall(args) => {
            let manifest = Manifest::load(&runtime, &args.manifest)?;
            let installer = MacOsInstaller::new(!runtime.is_privileged());

            let report = UninstallAction::new(&runtime, &installer).run(&manifest)?;
            for warning in &report.warnings {
                log::warn!("{}", warning);
            }
            println!("{} uninstalled.", manifest.name);
        }
        Commands::Zap(args) => {
            let manifest = Manifest::load(&runtime, &args.manifest)?;
            let installer = MacOsInstaller::new(!runtime.is_privileged());

            // Zap is strictly additive: base uninstall first, purge after.
            let report = UninstallAction::new(&runtime, &installer).run(&manifest)?;
            for warning in &report.warnings {
                log::warn!("{}", warning);
            }

            let action = ZapAction::new(&runtime);
            let targets = action.expand_targets(&manifest)?;
            if targets.is_empty() {
                println!("Nothing to purge for {}.", manifest.name);
                return Ok(());
            }

            if !args.yes {
                println!("The following paths will be removed:");
                for target in &targets {
                    println!("  {}", target.display());
                }
                if !runtime.confirm(&format!(
                    "Purge {} path(s) for {}?",
                    targets.len(),
                    manifest.name
                ))? {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            let report = action.run(&manifest)?;
            println!(
                "Purged {} path(s) for {}.",
                report.removed.len(),
                manifest.name
            );
            if !report.is_clean() {
                for failure in &report.failures {
                    eprintln!("Failed to remove {}: {}", failure.path.display(), failure.reason);
                }
                anyhow::bail!("{} path(s) could not be removed", report.failures.len());
            }
        }
        Commands::Livecheck(args) => {
            let manifest = Manifest::load(&runtime, &args.manifest)?;
            let config = Config::new(cli.api_url)?;
            let feed = GitHubFeed::from_http_client(config.http_client.clone(), &config.api_url);

            let result = LivecheckAction::new(&feed).run(&manifest).await?;
            match &result.latest {
                Some(latest) if result.newer_available => {
                    println!("{}: {} -> {}", result.package, result.declared, latest);
                }
                Some(latest) => {
                    println!("{}: up to date ({})", result.package, latest);
                }
                None => {
                    println!("{}: no releases found upstream", result.package);
                }
            }
        }
        Commands::Show(args) => {
            let manifest = Manifest::load(&runtime, &args.manifest)?;
            println!("{}", manifest.display_name());
            if let Some(desc) = &manifest.desc {
                println!("  {}", desc);
            }
            if let Some(homepage) = &manifest.homepage {
                println!("  homepage: {}", homepage);
            }
            println!("  artifact: {}", manifest.pkg_file_name()?);
            println!("  url: {}", manifest.resolve_download()?);
            println!("  sha256: {}", manifest.sha256);
            if let Some(uninstall) = &manifest.uninstall {
                if let Some(label) = &uninstall.launchctl {
                    println!("  uninstall launchctl: {}", label);
                }
                if let Some(id) = &uninstall.pkgutil {
                    println!("  uninstall pkgutil: {}", id);
                }
                if let Some(delete) = &uninstall.delete {
                    println!("  uninstall delete: {}", delete);
                }
            }
            if let Some(zap) = &manifest.zap {
                println!("  zap paths: {}", zap.trash.len());
            }
            if let Some(caveats) = &manifest.caveats {
                println!("\n{}", caveats.trim_end());
            }
        }
    }
    Ok(())
}
