use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use chrono::{Datelike, Utc};
use getopts::Options;
use sols_timetable::FILENAME;

pub struct Args {
    pub year: i32,
    pub calendar: Option<PathBuf>,
    pub mode: Mode,
}

pub enum Mode {
    Convert {
        input: PathBuf,
        output: Output,
        json: bool,
    },
    Serve {
        address: SocketAddr,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

pub enum Parsed {
    Help(String),
    Run(Args),
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "y",
        "year",
        "Calendar year the timetable belongs to [Default: current year]",
        "YEAR",
    );
    opts.optopt(
        "c",
        "calendar",
        "Academic calendar file to use instead of the built-in one",
        "FILE",
    );
    opts.optopt(
        "o",
        "output",
        "File to write the calendar to, `-` for stdout [Default: UOW_class_timetable.ics]",
        "FILE",
    );
    opts.optflag(
        "j",
        "json",
        "Read INPUT as a JSON list of classes instead of a saved timetable page",
    );
    opts.optflag("s", "serve", "Serve conversions over HTTP instead of converting a file");
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on when serving [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts
}

fn usage(opts: &Options) -> String {
    let brief = format!(
        "{}\n       {} --serve [options]",
        opts.short_usage(env!("CARGO_PKG_NAME")),
        env!("CARGO_PKG_NAME")
    );
    opts.usage(&brief)
}

pub fn try_parse(args: Vec<String>) -> Result<Parsed, String> {
    let opts = opts();
    let matches = opts.parse(args).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        return Ok(Parsed::Help(usage(&opts)));
    }

    let year = matches
        .opt_get_default("year", Utc::now().year())
        .map_err(|err| format!("Provided value for option 'year' is invalid: {err}"))?;

    let calendar = matches.opt_str("calendar").map(PathBuf::from);

    let mode = if matches.opt_present("serve") {
        let address = matches
            .opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
            .map_err(|err| format!("Provided value for option 'address' is invalid: {err}"))?;

        Mode::Serve { address }
    } else {
        let input = match matches.free.as_slice() {
            [input] => PathBuf::from(input),
            [] => return Err("Missing INPUT file (or use --serve)".to_string()),
            _ => return Err("Expected a single INPUT file".to_string()),
        };

        let output = match matches.opt_str("output").as_deref() {
            Some("-") => Output::Stdout,
            Some(path) => Output::File(PathBuf::from(path)),
            None => Output::File(PathBuf::from(FILENAME)),
        };

        let json = matches.opt_present("json")
            || input
                .extension()
                .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

        Mode::Convert {
            input,
            output,
            json,
        }
    };

    Ok(Parsed::Run(Args {
        year,
        calendar,
        mode,
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help(usage)) => {
            println!("{usage}");
            process::exit(0);
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", opts().short_usage(env!("CARGO_PKG_NAME")));
            process::exit(1);
        }
    }
}
