use std::path;
use std::process;

use bytesize::ByteSize;
use clap::ArgEnum;
use log;

use ext_line_sort::cli::{self, LogLevel};
use ext_line_sort::{ExternalSorter, ExternalSorterBuilder, FileRunStore, Record};

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    cli::init_logger(log_level);

    let order: Order = arg_parser.value_of_t_or_exit("sort");
    let capacity: usize = arg_parser.value_of_t_or_exit("max_lines");
    let tmp_dir: Option<&str> = arg_parser.value_of("tmp_dir");
    let rw_buf_size: Option<usize> = arg_parser
        .value_of("rw_buf_size")
        .map(|v| parse_rw_buf_size(v).expect("value is pre-validated"));

    let file = arg_parser.value_of("file").expect("value is required");
    let file = path::Path::new(file);
    if !file.is_file() {
        log::error!("file {} not found", file.display());
        process::exit(1);
    }

    let store = match FileRunStore::new(file, tmp_dir.map(path::Path::new), rw_buf_size) {
        Ok(store) => store,
        Err(err) => {
            log::error!("temporary directory creation error: {}", err);
            process::exit(1);
        }
    };

    let sorter: ExternalSorter<FileRunStore> = match ExternalSorterBuilder::new()
        .with_capacity(capacity)
        .with_store(store)
        .build()
    {
        Ok(sorter) => sorter,
        Err(err) => {
            log::error!("sorter initialization error: {}", err);
            process::exit(1);
        }
    };

    let result = match order {
        Order::Asc => sorter.sort(),
        Order::Desc => sorter.sort_by(|a: &Record, b: &Record| a.cmp(b).reverse()),
    };

    match result {
        Ok(summary) => log::info!(
            "{} sorted (lines: {}, initial runs: {}, merge rounds: {})",
            file.display(),
            summary.records,
            summary.initial_runs,
            summary.merge_rounds
        ),
        Err(err) => {
            log::error!("data sorting error: {}", err);
            process::exit(1);
        }
    }

    if let Err(err) = sorter.into_store().close() {
        log::error!("temporary directory removal error: {}", err);
        process::exit(1);
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Order::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Order as clap::ArgEnum>::from_str(s, false)
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-line-sort")
        .about("in-place external sorter of text file lines")
        .arg(
            clap::Arg::new("file")
                .short('f')
                .long("file")
                .help("file to be sorted in place")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("max_lines")
                .short('k')
                .long("max-lines-in-memory")
                .help("maximum number of lines held in memory simultaneously")
                .takes_value(true)
                .default_value("100")
                .validator(|v| match v.parse::<usize>() {
                    Ok(v) if v >= 2 => Ok(()),
                    Ok(v) => Err(format!("at least 2 lines are required, got {}", v)),
                    Err(err) => Err(format!("lines number format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("sort")
                .short('s')
                .long("sort")
                .help("sorting order")
                .takes_value(true)
                .default_value("asc")
                .possible_values(Order::possible_values()),
        )
        .arg(cli::log_level_arg("info"))
        .arg(
            clap::Arg::new("tmp_dir")
                .short('d')
                .long("tmp-dir")
                .help("directory to be used to store temporary data, created if missing")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("rw_buf_size")
                .short('b')
                .long("rw-buf-size")
                .help("temporary files read/write buffer size")
                .takes_value(true)
                .validator(|v| parse_rw_buf_size(v).map(|_| ())),
        )
        .get_matches()
}

fn parse_rw_buf_size(value: &str) -> Result<usize, String> {
    let size = value
        .parse::<ByteSize>()
        .map_err(|err| format!("Buffer size format incorrect: {}", err))?;

    match usize::try_from(size.as_u64()) {
        Ok(0) => Err("Buffer size should be positive".to_string()),
        Ok(size) => Ok(size),
        Err(_) => Err(format!("Buffer size {} is too large", size)),
    }
}
