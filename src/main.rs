use std::process::ExitCode;
use svg2hpgl::{init_logging, run, Command, BUILD_DATE, USAGE, VERSION};

fn main() -> ExitCode {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {:#} (try --help)", e);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            println!("{}", USAGE);
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("svg2hpgl {} (built {})", VERSION, BUILD_DATE);
            ExitCode::SUCCESS
        }
        Command::Convert(args) => {
            if let Err(e) = init_logging() {
                eprintln!("warning: {:#}", e);
            }
            match run(&args) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("error: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
