use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use road_bookmarks_config::Config;
use road_bookmarks_engine::{
    BookmarkListing, BookmarkService, MemoryHost, ServiceOptions, Store, TimerQueue, cleaner,
    listing,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "road-bookmarks", version, about = "Inspect and maintain saved line bookmarks")]
struct Cli {
    /// Config file to read instead of ~/.config/road-bookmarks/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bookmark store to use instead of the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every stored bookmark
    List {
        /// Print JSON instead of one line per bookmark
        #[arg(long)]
        json: bool,
    },
    /// Show the bookmarks stored for one file
    Show { file: PathBuf },
    /// Drop entries for deleted files and files without bookmarks
    Clean,
    /// Remove every bookmark stored for one file
    Forget { file: PathBuf },
    /// Print the location of the bookmark store
    Path,
    /// Keep cleaning the store on the configured interval
    Watch,
    /// Write a config file with the default settings
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

struct App {
    config_path: PathBuf,
    config: Config,
    store: Store,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
        log::debug!("Config path: {}", config_path.display());

        let config = Config::load_or_default(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;
        let store_path = cli.store.clone().unwrap_or_else(|| config.store_path());

        Ok(Self {
            config_path,
            config,
            store: Store::new(store_path),
        })
    }

    fn run(&self, command: &Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::List { json } => self.list(*json, out),
            Command::Show { file } => self.show(file, out),
            Command::Clean => self.clean(out),
            Command::Forget { file } => self.forget(file, out),
            Command::Path => {
                writeln!(out, "{}", self.store.path().display())?;
                Ok(())
            }
            Command::Watch => self.watch(),
            Command::Init { force } => self.init(*force, out),
        }
    }

    /// Service settings from the config, with the store location resolved
    fn service_options(&self) -> ServiceOptions {
        ServiceOptions::new(self.store.path())
            .with_intervals(self.config.watch_interval(), self.config.clean_interval())
    }

    fn list(&self, json: bool, out: &mut impl Write) -> Result<()> {
        let listings = listing::list_bookmarks(&self.store);
        if json {
            serde_json::to_writer_pretty(&mut *out, &listings)?;
            writeln!(out)?;
            return Ok(());
        }

        if listings.is_empty() {
            writeln!(out, "No bookmarks stored")?;
        }
        for item in &listings {
            writeln!(out, "{}", format_listing(item))?;
        }
        Ok(())
    }

    fn show(&self, file: &Path, out: &mut impl Write) -> Result<()> {
        let file = absolute(file)?;
        let entries = self
            .store
            .try_load()?
            .remove(&*file.to_string_lossy())
            .unwrap_or_default();

        if entries.is_empty() {
            writeln!(out, "No bookmarks stored for {}", file.display())?;
        }
        for entry in entries {
            writeln!(out, "{:>6}  {:>8}", entry.pos, entry.line_label())?;
        }
        Ok(())
    }

    fn clean(&self, out: &mut impl Write) -> Result<()> {
        // Surface a broken store instead of silently skipping it
        self.store.try_load()?;

        let host = MemoryHost::new();
        let removed = cleaner::clean(&self.store, &host);
        writeln!(out, "Removed {} stale entries", removed.len())?;
        for file in removed {
            writeln!(out, "  {file}")?;
        }
        Ok(())
    }

    fn forget(&self, file: &Path, out: &mut impl Write) -> Result<()> {
        let file = absolute(file)?;
        if self.store.try_remove(&file)? {
            writeln!(out, "Forgot bookmarks for {}", file.display())?;
        } else {
            writeln!(out, "No bookmarks stored for {}", file.display())?;
        }
        Ok(())
    }

    fn watch(&self) -> Result<()> {
        let queue = Rc::new(TimerQueue::new());
        let service = BookmarkService::new(
            Rc::new(MemoryHost::new()),
            queue.clone(),
            self.service_options(),
        );

        log::info!(
            "Cleaning {} every {:?}",
            self.store.path().display(),
            service.cleaner().interval()
        );
        service.start();
        queue.run_realtime(|| !service.is_running());
        Ok(())
    }

    fn init(&self, force: bool, out: &mut impl Write) -> Result<()> {
        if self.config_path.exists() && !force {
            anyhow::bail!(
                "{} already exists, pass --force to replace it",
                self.config_path.display()
            );
        }

        Config::default().save_to_path(&self.config_path)?;
        writeln!(out, "Wrote {}", self.config_path.display())?;
        Ok(())
    }
}

fn format_listing(item: &BookmarkListing) -> String {
    format!("{:<40} {}", item.label, item.detail)
}

/// Store keys are absolute paths
fn absolute(file: &Path) -> Result<PathBuf> {
    std::path::absolute(file).with_context(|| format!("resolving {}", file.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let app = App::new(&cli)?;
    let stdout = io::stdout();
    app.run(&cli.command, &mut stdout.lock())
}
