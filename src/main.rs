use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

use billbook::{Config, SimpleBill, SimpleBillModel};

fn main() -> Result<()> {
    billbook::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    // ex: billbook --data-dir /tmp/books list
    let config = if args.first().map(String::as_str) == Some("--data-dir") {
        args.remove(0);
        if args.is_empty() {
            bail!("--data-dir requires a path");
        }
        Config::from_base(PathBuf::from(args.remove(0)))
    } else {
        Config::load()?
    };

    match args.first().map(String::as_str) {
        Some("init") => run_init(&config),
        Some("import") => match args.get(1) {
            Some(filename) => run_import(&config, filename),
            None => bail!("usage: billbook import <file>"),
        },
        Some("list") => run_list(&config, args.get(1).map(String::as_str)),
        Some("unpaid") => run_unpaid(&config),
        Some("paid") => match (args.get(1), args.get(2)) {
            (Some(id), Some(date)) => run_paid(&config, id, date),
            _ => bail!("usage: billbook paid <id> <YYYY-MM-DD>"),
        },
        Some("export") => match args.get(1) {
            Some(period) => run_export(&config, period),
            None => bail!("usage: billbook export <YYYY-MM>"),
        },
        Some(other) => {
            eprintln!("Unknown command '{}'", other);
            print_usage();
            std::process::exit(1);
        }
        None => {
            print_usage();
            Ok(())
        }
    }
}

fn open_model(config: &Config) -> Result<SimpleBillModel> {
    Ok(SimpleBillModel::new(config)?)
}

fn run_init(config: &Config) -> Result<()> {
    config.ensure_dirs()?;
    config.save()?;
    SimpleBillModel::new(config)?;

    println!("Initialized database at {}", config.db_path.display());
    println!("Bill files directory: {}", config.files_dir.display());
    Ok(())
}

fn run_import(config: &Config, filename: &str) -> Result<()> {
    let model = open_model(config)?;
    let bill = model
        .process_bill_file(filename)
        .with_context(|| format!("failed to process bill file '{}'", filename))?;
    let id = model.insert_bill(&bill)?;

    println!(
        "Imported {} bill {} for period {}",
        bill.core.service_provider.provider.value(),
        id,
        bill.core.bill_month_year()
    );
    Ok(())
}

fn run_list(config: &Config, period: Option<&str>) -> Result<()> {
    let model = open_model(config)?;
    let bills = match period {
        Some(month_year) => model.bills_for_period(month_year)?,
        None => model.bills()?,
    };
    print_bills(&bills);
    Ok(())
}

fn run_unpaid(config: &Config) -> Result<()> {
    let model = open_model(config)?;
    print_bills(&model.unpaid_bills()?);
    Ok(())
}

fn run_paid(config: &Config, id: &str, date: &str) -> Result<()> {
    let id: i64 = id
        .parse()
        .with_context(|| format!("invalid bill id '{}'", id))?;
    let paid_date: NaiveDate = date
        .parse()
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", date))?;

    let model = open_model(config)?;
    model.mark_paid(id, paid_date)?;

    println!("Marked bill {} paid on {}", id, paid_date);
    Ok(())
}

fn run_export(config: &Config, period: &str) -> Result<()> {
    let model = open_model(config)?;
    let bills = model.bills_for_period(period)?;
    if bills.is_empty() {
        println!("No bills for period {}", period);
        return Ok(());
    }

    for bill in &bills {
        let filename = model.save_bill_to_file(bill)?;
        println!("Wrote {}", filename);
    }
    Ok(())
}

fn print_bills(bills: &[SimpleBill]) {
    if bills.is_empty() {
        println!("No bills found.");
        return;
    }

    println!(
        "{:<5} {:<8} {:<10} {:<11} {:<11} {:>10} {:<11} {}",
        "id", "period", "provider", "start", "end", "total", "paid", "notes"
    );
    for bill in bills {
        println!(
            "{:<5} {:<8} {:<10} {:<11} {:<11} {:>10} {:<11} {}",
            bill.core.id.map_or("-".to_string(), |id| id.to_string()),
            bill.core.bill_month_year(),
            bill.core.service_provider.provider.value(),
            bill.core.start_date().to_string(),
            bill.core.end_date().to_string(),
            bill.core.total_cost.to_string(),
            bill.core
                .paid_date()
                .map_or("unpaid".to_string(), |d| d.to_string()),
            bill.core.notes.as_deref().unwrap_or(""),
        );
    }
}

fn print_usage() {
    println!("billbook {}", billbook::VERSION);
    println!();
    println!("Usage: billbook [--data-dir <path>] <command> [args]");
    println!();
    println!("Options:");
    println!("  --data-dir <path>        Keep the database and bill files under <path>");
    println!();
    println!("Commands:");
    println!("  init                     Create the config file, database, and file directories");
    println!("  import <file>            Read a bill file from the files directory and store it");
    println!("  list [YYYY-MM]           Show stored bills, optionally for one period");
    println!("  unpaid                   Show bills with no paid date");
    println!("  paid <id> <YYYY-MM-DD>   Set the paid date on a stored bill");
    println!("  export <YYYY-MM>         Write each bill in a period back to a bill file");
}
