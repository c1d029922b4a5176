use crate::{
    backup::{last_backup_message, record_backup, BackupCompleteScreen},
    config::{Config, PrefsBackendKind},
    funds::{StaticFundsSource, TransferFundsSource},
    prefs::{PrefValue, PreferencesStore, SledBackend},
    transactions::{
        AccountSelection, DisplayableTransaction, MemoryTransactionSource,
        TransactionListDataManager, TransactionSource,
    },
    ui::{console, tui},
};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.wallet-ui/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `data_dir` from the config file
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    /// Overrides `log_level` from the config file
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read and write preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommand,
    },

    /// Backup status and the backup-complete screen
    Backup {
        #[command(subcommand)]
        action: BackupCommand,
    },

    /// List transactions for an account
    Transactions {
        /// Transaction snapshot (JSON); defaults to transactions.json in the data dir
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// all, imported, eth, or an xpub / imported address
        #[arg(short, long, default_value = "all")]
        account: String,

        /// Defaults to `page_size` from the config file
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Run the TUI
    Tui {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Sweepable funds (JSON) to offer on the Backup tab
        #[arg(long)]
        funds_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    Get {
        name: String,
        #[arg(short, long, value_enum, default_value_t = PrefKind::String)]
        kind: PrefKind,
        /// Returned when the preference is missing
        #[arg(long)]
        default: Option<String>,
    },
    Set {
        name: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[arg(short, long, value_enum, default_value_t = PrefKind::String)]
        kind: PrefKind,
    },
    Has {
        name: String,
    },
    Remove {
        name: String,
    },
    /// Remove every preference
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Record that the wallet was just backed up
    Record,

    /// Show the backup-complete screen
    Complete {
        /// Offer to sweep funds from imported addresses
        #[arg(long)]
        check_transfer: bool,

        /// Sweepable funds (JSON)
        #[arg(long)]
        funds_file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKind {
    String,
    Int,
    Long,
    Bool,
}

impl PrefKind {
    /// Parse `raw` as this kind
    pub fn parse(self, raw: &str) -> Result<PrefValue> {
        Ok(match self {
            PrefKind::String => PrefValue::Str(raw.to_string()),
            PrefKind::Int => PrefValue::Int(
                raw.parse()
                    .with_context(|| format!("Invalid int value: {}", raw))?,
            ),
            PrefKind::Long => PrefValue::Long(
                raw.parse()
                    .with_context(|| format!("Invalid long value: {}", raw))?,
            ),
            PrefKind::Bool => PrefValue::Bool(
                raw.parse()
                    .with_context(|| format!("Invalid bool value: {}", raw))?,
            ),
        })
    }
}

impl Cli {
    /// Resolve the config file and apply command-line overrides
    pub fn load_config(&self) -> Result<Config> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => Config::default_path()?,
        };
        let mut config = Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

/// `RUST_LOG` when set, otherwise `level`, otherwise `info`
pub fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

impl Cli {
    /// Load the config under a provisional subscriber writing to
    /// `make_writer`, so events logged while loading are not lost
    pub fn load_config_logged<W>(&self, make_writer: W) -> Result<Config>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(log_filter(self.log_level.as_deref().unwrap_or("info")))
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::with_default(subscriber, || self.load_config())
    }
}

/// Open the preferences store configured for `config`
pub fn open_prefs(config: &Config) -> Result<PreferencesStore> {
    match config.prefs_backend {
        PrefsBackendKind::Sled => {
            let dir = config.data_dir();
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
            let backend =
                SledBackend::open(config.prefs_path()).context("Failed to open preferences")?;
            Ok(PreferencesStore::open(backend)?)
        }
        PrefsBackendKind::Memory => {
            warn!("Using in-memory preferences; nothing will be saved");
            Ok(PreferencesStore::in_memory()?)
        }
    }
}

pub async fn run_cli(cli: Cli, config: Config) -> Result<()> {
    let prefs = open_prefs(&config)?;

    let result = run_command(cli.command, &config, &prefs).await;

    // Persist whatever the command managed to write, even on failure
    let flushed = prefs.close().await.context("Failed to save preferences");
    result.and(flushed)
}

async fn run_command(command: Commands, config: &Config, prefs: &PreferencesStore) -> Result<()> {
    match command {
        Commands::Prefs { action } => run_prefs(action, prefs),

        Commands::Backup {
            action: BackupCommand::Record,
        } => {
            record_backup(prefs, Utc::now());
            if let Some(message) = last_backup_message(prefs, &config.date_format) {
                println!("{}", message);
            }
            Ok(())
        }

        Commands::Backup {
            action:
                BackupCommand::Complete {
                    check_transfer,
                    funds_file,
                },
        } => {
            let screen = BackupCompleteScreen::new(
                prefs.clone(),
                load_funds(funds_file.as_deref())?,
                Arc::new(console::ConsoleNavigator),
                Arc::new(console::ConsoleDialogs),
            )
            .check_transfer(check_transfer)
            .date_format(config.date_format.clone());

            let outcome = console::run_backup_complete(screen, &console::DialoguerPrompt).await?;
            debug!(?outcome, "Left backup-complete screen");
            Ok(())
        }

        Commands::Transactions {
            file,
            account,
            limit,
            offset,
        } => {
            let path = file.unwrap_or_else(|| config.data_dir().join("transactions.json"));
            let source = load_transactions(&path)?;
            let selection: AccountSelection = account.parse()?;
            let mut manager = TransactionListDataManager::new(source);

            let list = manager
                .fetch_transactions(&selection, limit.unwrap_or(config.page_size), offset)
                .await
                .context("Failed to fetch transactions")?;

            if list.is_empty() {
                println!("No transactions found.");
            }
            for tx in list {
                println!("{}", tui::transaction_line(tx));
            }

            if selection != AccountSelection::Ethereum {
                match manager.btc_balance(&selection).await {
                    Ok(balance) => println!("Balance: {} sat", balance),
                    Err(e) => warn!("Balance unavailable: {}", e),
                }
            }
            Ok(())
        }

        Commands::Tui { file, funds_file } => {
            let path = file.unwrap_or_else(|| config.data_dir().join("transactions.json"));
            let transactions = if path.exists() {
                let mut manager = TransactionListDataManager::new(load_transactions(&path)?);
                manager
                    .fetch_transactions(
                        &AccountSelection::AllAccountsAndImported,
                        config.page_size,
                        0,
                    )
                    .await?
                    .to_vec()
            } else {
                Vec::<DisplayableTransaction>::new()
            };

            let platform = tui::TuiPlatform::new();
            let screen = BackupCompleteScreen::new(
                prefs.clone(),
                load_funds(funds_file.as_deref())?,
                Arc::new(platform.clone()),
                Arc::new(platform.clone()),
            )
            .check_transfer(funds_file.is_some())
            .date_format(config.date_format.clone());
            let state = tui::TuiState::new(transactions, screen, platform);

            tokio::task::block_in_place(|| -> Result<()> {
                let mut ui = tui::WalletTui::new(state).context("Failed to start terminal UI")?;
                ui.run().context("Terminal UI failed")?;
                Ok(())
            })
        }
    }
}

fn run_prefs(action: PrefsCommand, prefs: &PreferencesStore) -> Result<()> {
    match action {
        PrefsCommand::Get {
            name,
            kind,
            default,
        } => {
            let value = match kind {
                PrefKind::String => prefs.get_string(&name, default.as_deref()),
                PrefKind::Int => {
                    let default = parse_default(kind, default.as_deref())?;
                    prefs.get_int(&name, default.map_or(0, |v| v as i32)).to_string()
                }
                PrefKind::Long => {
                    let default = parse_default(kind, default.as_deref())?;
                    prefs.get_long(&name, default.unwrap_or(0)).to_string()
                }
                PrefKind::Bool => {
                    let default = match default.as_deref() {
                        Some(raw) => raw
                            .parse::<bool>()
                            .with_context(|| format!("Invalid bool value: {}", raw))?,
                        None => false,
                    };
                    prefs.get_bool(&name, default).to_string()
                }
            };
            println!("{}", value);
        }
        PrefsCommand::Set { name, value, kind } => match kind.parse(&value)? {
            PrefValue::Str(s) => prefs.set_string(&name, Some(&s)),
            PrefValue::Int(v) => prefs.set_int(&name, v),
            PrefValue::Long(v) => prefs.set_long(&name, v),
            PrefValue::Bool(v) => prefs.set_bool(&name, v),
        },
        PrefsCommand::Has { name } => println!("{}", prefs.has(&name)),
        PrefsCommand::Remove { name } => prefs.remove(&name),
        PrefsCommand::Clear => prefs.clear(),
    }
    Ok(())
}

/// Numeric default for int/long reads
fn parse_default(kind: PrefKind, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(|raw| kind.parse(raw)).transpose()? {
        None => Ok(None),
        Some(PrefValue::Int(v)) => Ok(Some(i64::from(v))),
        Some(PrefValue::Long(v)) => Ok(Some(v)),
        Some(other) => bail!("Unexpected default of kind {}", other.kind()),
    }
}

fn load_transactions(path: &Path) -> Result<Arc<dyn TransactionSource>> {
    let source = MemoryTransactionSource::load(path)
        .with_context(|| format!("Failed to load transactions from {}", path.display()))?;
    Ok(Arc::new(source))
}

fn load_funds(path: Option<&Path>) -> Result<Arc<dyn TransferFundsSource>> {
    let source = match path {
        Some(path) => StaticFundsSource::load(path)
            .with_context(|| format!("Failed to load funds from {}", path.display()))?,
        None => StaticFundsSource::empty(),
    };
    Ok(Arc::new(source))
}
