use clap::{Arg, ArgAction, Command};
use sheet_ingest::REQUIRED_COLUMNS;
use std::io::{self, Write};

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Write a product sheet as CSV to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(Arg::new("prefix").long("prefix").default_value("Product"))
        .arg(
            Arg::new("duplicate")
                .long("duplicate")
                .help("Repeat the first product name on the last row")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no_header")
                .long("no-header")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let rows = matches.get_one::<u64>("rows").copied().unwrap_or_default();
    let prefix = matches
        .get_one::<String>("prefix")
        .map(String::as_str)
        .unwrap_or("Product");
    let duplicate = matches.get_flag("duplicate");

    let mut out = io::BufWriter::new(io::stdout().lock());

    if !matches.get_flag("no_header") {
        writeln!(&mut out, "{}", REQUIRED_COLUMNS.join(","))?;
    }

    // deterministic values: name, price, quantity, stock
    for i in 0..rows {
        let n = if duplicate && rows > 1 && i == rows - 1 { 0 } else { i };
        writeln!(
            &mut out,
            "{prefix} {n:06},{}.{:02},{},{}",
            10 + i % 90,
            i % 100,
            1 + i % 12,
            (i * 7) % 500
        )?;
    }

    out.flush()?;
    Ok(())
}
