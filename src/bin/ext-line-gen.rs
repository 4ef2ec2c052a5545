use std::fs;
use std::io::{self, prelude::*};
use std::process;

use log;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ext_line_sort::cli::{self, LogLevel};
use ext_line_sort::generator;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    cli::init_logger(log_level);

    let lines_count: usize = arg_parser.value_of_t_or_exit("lines_count");
    let max_length: usize = arg_parser.value_of_t_or_exit("max_length");
    let mut rng = if arg_parser.is_present("random_seed") {
        StdRng::seed_from_u64(arg_parser.value_of_t_or_exit("random_seed"))
    } else {
        StdRng::from_entropy()
    };

    let mut output_stream: Box<dyn Write> = match arg_parser.value_of("file_name") {
        Some(file_name) => match fs::File::create(file_name) {
            Ok(file) => Box::new(io::BufWriter::new(file)),
            Err(err) => {
                log::error!("output file creation error: {}", err);
                process::exit(1);
            }
        },
        None => Box::new(io::BufWriter::new(io::stdout())),
    };

    log::info!("generating {} lines (max length: {})", lines_count, max_length);

    if let Err(err) = generator::populate(&mut output_stream, &mut rng, max_length, lines_count) {
        log::error!("data generation error: {}", err);
        process::exit(1);
    }

    if let Err(err) = output_stream.flush() {
        log::error!("data flushing error: {}", err);
        process::exit(1);
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("ext-line-gen")
        .about("random text lines generator")
        .arg(
            clap::Arg::new("file_name")
                .short('f')
                .long("file-name")
                .help("file to generate, standard output if omitted")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("lines_count")
                .short('n')
                .long("lines-count")
                .help("how many lines to generate")
                .takes_value(true)
                .default_value("100"),
        )
        .arg(
            clap::Arg::new("max_length")
                .short('m')
                .long("max-length")
                .help("greatest line length")
                .takes_value(true)
                .default_value("50"),
        )
        .arg(
            clap::Arg::new("random_seed")
                .short('r')
                .long("random-seed")
                .help("seed to generate lines with")
                .takes_value(true),
        )
        .arg(cli::log_level_arg("warn"))
        .get_matches()
}
