use std::fs;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Error;
use clap::{value_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use quadsat::{Solver, SolverConfig};
use quadsat_dimacs::parse_dimacs;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    // Prefix all log output with 'c ' so it reads as DIMACS comments.
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = std::env::var("QUADSAT_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("quadsat")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The input file to use (stdin if omitted)'")
        .arg(
            Arg::from_usage("[engine] -e --engine=[ENGINE] 'The decision procedure to run'")
                .possible_values(&["resolution", "dp", "dpll", "cdcl"])
                .default_value("cdcl")
                .case_insensitive(true),
        )
        .arg_from_usage(
            "[threads] -t --threads=[N] \
             'Worker threads for the parallel resolution and dp variants (0 = all cores)'",
        )
        .arg_from_usage("[timeout] --timeout=[SECS] 'Report UNKNOWN after this many seconds'")
        .arg_from_usage("[seed] --seed=[SEED] 'Seed for the CDCL branching RNG'")
        .get_matches();

    init_logging();
    info!("this is quadsat {}", env!("CARGO_PKG_VERSION"));

    let mut config = SolverConfig::default();
    config.engine = matches
        .value_of("engine")
        .unwrap()
        .to_ascii_lowercase()
        .parse()
        .map_err(Error::msg)?;
    if matches.is_present("threads") {
        config.threads = value_t!(matches, "threads", usize)?;
    }
    if matches.is_present("seed") {
        config.seed = value_t!(matches, "seed", u64)?;
    }

    let total_start = Instant::now();

    let parse_start = Instant::now();
    let formula = match matches.value_of("INPUT") {
        Some(path) => {
            info!("reading file '{}'", path);
            parse_dimacs(fs::File::open(path)?)?
        }
        None => {
            info!("reading from stdin");
            let stdin = io::stdin();
            parse_dimacs(stdin.lock())?
        }
    };
    let parse_time = parse_start.elapsed();

    let mut solver = Solver::with_config(config);
    solver.add_formula(&formula);

    if matches.is_present("timeout") {
        let secs = value_t!(matches, "timeout", u64)?;
        let token = solver.cancel_token();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            token.cancel();
        });
    }

    let solution = solver.solve();

    if !solution.verdict.is_decided() {
        info!("gave up before reaching a verdict");
    }

    println!("Result: {}", solution.verdict);
    if let Some(model) = &solution.model {
        print!("v");
        for lit in model {
            print!(" {}", lit);
        }
        println!(" 0");
    }

    let total_time = total_start.elapsed();
    println!("Timing Breakdown:");
    println!("  Parsing Time: {:.3} ms", ms(parse_time));
    println!("  Solving Time: {:.3} ms", ms(solution.solve_time));
    println!("  Total Time:   {:.3} ms", ms(total_time));

    Ok(0)
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e3
}
