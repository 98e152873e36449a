use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{LedgerConfig, MissingRulePolicy, Operation, Response, RuleLedgerService};
use crate::logging::setup_logger;
use crate::storage::SqliteStore;

/// Ruleledger - rule records on a key-value ledger
#[derive(Parser)]
#[command(name = "ruleledger")]
#[command(about = "Store, query and update rule records in a local key-value ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "RULELEDGER_DB", default_value = "ruleledger.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fail when changing the port of a rule that does not exist
    #[arg(long, global = true, env = "RULELEDGER_STRICT")]
    pub strict: bool,

    /// First key (inclusive) listed by queryAllRules
    #[arg(long, global = true, env = "RULELEDGER_SCAN_START", default_value = "Rule0")]
    pub scan_start: String,

    /// Last key (exclusive) listed by queryAllRules
    #[arg(long, global = true, env = "RULELEDGER_SCAN_END", default_value = "Rule999")]
    pub scan_end: String,

    /// Prefix of the keys written by the default seed
    #[arg(long, global = true, env = "RULELEDGER_KEY_PREFIX", default_value = "Rule")]
    pub key_prefix: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Invoke an operation by name, as a host would
    Invoke {
        /// Operation name (queryRule, initLedger, createRule, queryAllRules, changeRuleSourcePort)
        function: String,

        /// Operation arguments
        args: Vec<String>,
    },

    /// Write the default rules Rule0..Rule9
    Seed,

    /// Show the record stored under a key
    Query {
        /// Rule key (e.g., "Rule0")
        key: String,
    },

    /// Create or overwrite a rule
    Create {
        /// Rule key (e.g., "Rule10")
        key: String,

        /// Rule action (e.g., "alert")
        action: String,

        /// Protocol (e.g., "tcp")
        protocol: String,

        /// Source IP or placeholder (e.g., "$HOME_NET")
        source_ip: String,

        /// Source port number or "any"
        source_port: String,
    },

    /// List every rule in the scan range
    List,

    /// Change the source port of a rule
    SetPort {
        /// Rule key
        key: String,

        /// New source port number or "any"
        port: String,
    },

    /// Export rules to CSV or JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Import rules from a JSON export
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Leave keys that already hold a rule untouched
        #[arg(long)]
        skip_existing: bool,
    },
}

impl Cli {
    fn config(&self) -> LedgerConfig {
        let policy = if self.strict {
            MissingRulePolicy::Reject
        } else {
            MissingRulePolicy::Fabricate
        };
        LedgerConfig::default()
            .with_scan_range(self.scan_start.clone(), self.scan_end.clone())
            .with_key_prefix(self.key_prefix.clone())
            .with_missing_rule(policy)
    }

    pub async fn run(self) -> Result<()> {
        setup_logger(self.verbose);
        let config = self.config();

        match self.command {
            Commands::Init => {
                let store = SqliteStore::init(&self.database).await?;
                let service = RuleLedgerService::with_config(store, config);
                expect_success(service.init())?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Invoke { function, args } => {
                let service = connect(&self.database, config).await?;
                let payload = invoke(&service, &function, args).await?;
                if !payload.is_empty() {
                    println!("{}", String::from_utf8_lossy(&payload));
                }
            }

            Commands::Seed => {
                let service = connect(&self.database, config).await?;
                invoke(&service, Operation::InitLedger.as_str(), vec![]).await?;
                println!("Seeded default rules");
            }

            Commands::Query { key } => {
                let service = connect(&self.database, config).await?;
                let payload = invoke(&service, Operation::QueryRule.as_str(), vec![key.clone()]).await?;
                if payload.is_empty() {
                    eprintln!("No rule stored under {}", key);
                } else {
                    println!("{}", String::from_utf8_lossy(&payload));
                }
            }

            Commands::Create {
                key,
                action,
                protocol,
                source_ip,
                source_port,
            } => {
                let service = connect(&self.database, config).await?;
                let args = vec![key.clone(), action, protocol, source_ip, source_port];
                invoke(&service, Operation::CreateRule.as_str(), args).await?;
                println!("Created rule {}", key);
            }

            Commands::List => {
                let service = connect(&self.database, config).await?;
                let payload = invoke(&service, Operation::QueryAllRules.as_str(), vec![]).await?;
                println!("{}", String::from_utf8_lossy(&payload));
            }

            Commands::SetPort { key, port } => {
                let service = connect(&self.database, config).await?;
                let args = vec![key.clone(), port.clone()];
                invoke(&service, Operation::ChangeRuleSourcePort.as_str(), args).await?;
                println!("Changed source port of {} to {}", key, port);
            }

            Commands::Export { output, format } => {
                let service = connect(&self.database, config).await?;
                run_export_command(&service, output.as_deref(), &format).await?;
            }

            Commands::Import {
                input,
                dry_run,
                skip_existing,
            } => {
                let service = connect(&self.database, config).await?;
                run_import_command(&service, input.as_deref(), dry_run, skip_existing).await?;
            }
        }

        Ok(())
    }
}

async fn connect(database: &str, config: LedgerConfig) -> Result<RuleLedgerService<SqliteStore>> {
    let store = SqliteStore::connect(database)
        .await
        .with_context(|| format!("Failed to open ledger {}", database))?;
    Ok(RuleLedgerService::with_config(store, config))
}

fn expect_success(response: Response) -> Result<Vec<u8>> {
    match response {
        Response::Success { payload } => Ok(payload),
        Response::Error { message } => anyhow::bail!("{}", message),
    }
}

async fn invoke(
    service: &RuleLedgerService<SqliteStore>,
    function: &str,
    args: Vec<String>,
) -> Result<Vec<u8>> {
    expect_success(service.invoke(function, &args).await)
}

async fn run_export_command(
    service: &RuleLedgerService<SqliteStore>,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match format {
        "csv" => exporter.export_rules_csv(writer).await?,
        "json" => exporter.export_rules_json(writer).await?,
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    };

    if output.is_some() {
        eprintln!("Exported {} rules", count);
    }

    Ok(())
}

async fn run_import_command(
    service: &RuleLedgerService<SqliteStore>,
    input: Option<&str>,
    dry_run: bool,
    skip_existing: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let importer = Importer::new(service);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_existing,
    };
    let result = importer.import_rules_json(reader, options).await?;

    if dry_run {
        println!("Validation successful");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Entry {}: {}",
                error.index,
                error
                    .key
                    .as_ref()
                    .map(|k| format!("{}: ", k))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}
