use clap::{Arg, ArgAction, ArgMatches, Command};
use sheet_ingest::config::{DEFAULT_STORAGE_KEY, DEFAULT_STORE_DIR, STORAGE_KEY_ENV, STORE_DIR_ENV};
use sheet_ingest::{columns, CatalogConfig, FileStore, IngestionPipeline, Record};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sheet_ingest::logging::init("warn");

    let matches = Command::new("catalog")
        .about("Upload product sheets into a local catalog, list it, and delete entries")
        .subcommand_required(true)
        .arg(
            Arg::new("store-dir")
                .long("store-dir")
                .env(STORE_DIR_ENV)
                .default_value(DEFAULT_STORE_DIR)
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .env(STORAGE_KEY_ENV)
                .default_value(DEFAULT_STORAGE_KEY)
                .global(true),
        )
        .subcommand(
            Command::new("upload")
                .about("Validate a sheet, preview it, and merge it on confirmation")
                .arg(Arg::new("path").required(true).value_parser(clap::value_parser!(PathBuf)))
                .arg(Arg::new("yes").long("yes").short('y').help("Confirm without asking").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("list").about("Print the catalog"))
        .subcommand(
            Command::new("delete")
                .about("Delete the record at a position shown by `list`")
                .arg(Arg::new("index").required(true).value_parser(clap::value_parser!(usize))),
        )
        .get_matches();

    let config = config_from(&matches);
    let mut pipeline = IngestionPipeline::open(&config);

    match matches.subcommand() {
        Some(("upload", sub)) => upload(&mut pipeline, sub).await,
        Some(("list", _)) => {
            print_table(pipeline.collection(), true);
            Ok(())
        }
        Some(("delete", sub)) => {
            let index = sub.get_one::<usize>("index").copied().unwrap_or_default();
            match pipeline.remove_at(index)? {
                Some(_) => println!("Deleted record {index}."),
                None => println!("No record at position {index}; nothing deleted."),
            }
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}

fn config_from(matches: &ArgMatches) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    if let Some(dir) = matches.get_one::<PathBuf>("store-dir") {
        config = config.with_store_dir(dir.clone());
    }
    if let Some(key) = matches.get_one::<String>("key") {
        config = config.with_storage_key(key.clone());
    }
    config
}

async fn upload(pipeline: &mut IngestionPipeline<FileStore>, sub: &ArgMatches) -> anyhow::Result<()> {
    let Some(path) = sub.get_one::<PathBuf>("path") else {
        anyhow::bail!("missing path");
    };

    let ready = match pipeline.ingest_path(path).await {
        Ok(ready) => ready,
        Err(err) => {
            eprintln!("{}", err.user_message());
            std::process::exit(1);
        }
    };

    println!("Preview ({} rows):", ready.rows);
    print_table(pipeline.preview().unwrap_or_default(), false);

    let confirmed = sub.get_flag("yes") || ask("Merge into the catalog? [y/N] ").await?;
    if confirmed {
        let added = pipeline.confirm()?;
        println!("Added {added} records; catalog now has {}.", pipeline.collection().len());
    } else {
        pipeline.cancel();
        println!("Upload cancelled.");
    }
    Ok(())
}

async fn ask(prompt: &str) -> anyhow::Result<bool> {
    let mut out = tokio::io::stdout();
    out.write_all(prompt.as_bytes()).await?;
    out.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn print_table(records: &[Record], with_positions: bool) {
    if records.is_empty() {
        println!("No file uploaded yet.");
        return;
    }
    let header = columns(records).join(" | ");
    if with_positions {
        println!("# | {header}");
    } else {
        println!("{header}");
    }
    for (i, record) in records.iter().enumerate() {
        let cells: Vec<String> = record.values().map(ToString::to_string).collect();
        if with_positions {
            println!("{i} | {}", cells.join(" | "));
        } else {
            println!("{}", cells.join(" | "));
        }
    }
}
