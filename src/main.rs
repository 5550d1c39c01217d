use amortize::{Loan, Money, Report, Store};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::{debug, error, LevelFilter};
use rust_decimal::Decimal;
use simple_logger::SimpleLogger;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "amortize", version, about = "Calculates and stores amortization tables")]
struct Cli {
    /// Database to use
    #[arg(long, env = "AMORTIZE_DB", default_value = "amortize.db", global = true)]
    db: PathBuf,

    /// Sets the level of verbosity (-v debug, -vv trace)
    #[arg(short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initializes the database
    Init,
    /// Creates a new loan and stores its schedule
    Create {
        /// Name of loan
        name: String,
        /// Balance of the loan in currency units, e.g. 2131.00
        #[arg(short, long)]
        balance: Money,
        /// Annual percentage rate, e.g. 3.75
        #[arg(short, long)]
        apr: Decimal,
        /// Term in years
        #[arg(short, long)]
        term: u32,
        /// Loan start date (YYYY-MM-DD); the first payment is a month later
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Lists every loan
    List,
    /// Shows one loan and its schedule
    Show {
        /// Name of loan
        name: String,
        /// Print every period instead of the summary only
        #[arg(long)]
        all: bool,
    },
    /// Recomputes and stores a loan's schedule
    Regenerate {
        /// Name of loan
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).env().init()?;
    debug!("{:?}", cli);

    match cli.command {
        Command::Init => {
            Store::init(&cli.db)
                .with_context(|| format!("initializing {}", cli.db.display()))?;
        }
        Command::Create {
            name,
            balance,
            apr,
            term,
            start,
        } => {
            let start = start.unwrap_or_else(|| Local::now().date_naive());
            let loan = Loan::new(name, apr, balance, term, start);
            let store = open(&cli.db)?;
            match store.originate(&loan) {
                Ok(_) => show_summary(&store.report(&loan.name)?),
                Err(err) if err.is_validation() => {
                    error!("Invalid loan {}: {}", loan.name, err);
                    std::process::exit(2);
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("creating loan {}", loan.name))
                }
            }
        }
        Command::List => {
            let store = open(&cli.db)?;
            for loan in store.loans().list()? {
                println!("{}", loan);
            }
        }
        Command::Show { name, all } => {
            let store = open(&cli.db)?;
            let report = store
                .report(&name)
                .with_context(|| format!("loading loan {}", name))?;
            show_summary(&report);
            if all {
                show_amortization(&report);
            }
        }
        Command::Regenerate { name } => {
            let store = open(&cli.db)?;
            let entries = store
                .regenerate(&name)
                .with_context(|| format!("regenerating loan {}", name))?;
            println!("Stored {} periods for {}", entries.len(), name);
        }
    }
    Ok(())
}

fn open(db: &Path) -> Result<Store> {
    Store::open(db).with_context(|| format!("opening {}", db.display()))
}

fn show_summary(report: &Report) {
    println!("{}", report.loan);
    println!("Monthly payment: ${}", report.level_payment());
    println!(
        "Total paid: ${} (interest ${})",
        report.total_paid(),
        report.total_interest()
    );
}

fn show_amortization(report: &Report) {
    for pmt in &report.entries {
        println!("{}", pmt);
    }
}
