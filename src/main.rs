//! CLI interface for flight-optimizer
//!
//! ```text
//! flight-optimizer --from "London" --to "Paris" "Rome" "Berlin"
//! ```

use clap::Parser;
use flight_optimizer::{
    CityResolver, Config, FareSearch, FlightError, Location, OptimizationOutcome, OptimizeError,
    Optimizer, RankedResult, Reporter, TequilaClient, TripQuery,
};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_OK: u8 = 0;
const EXIT_CONFIG: u8 = 1;
const EXIT_ORIGIN_UNRESOLVED: u8 = 2;
const EXIT_NO_DESTINATIONS: u8 = 3;
const EXIT_NO_FARES: u8 = 4;

#[derive(Parser, Debug)]
#[command(name = "flight-optimizer")]
#[command(about = "Find the cheapest flight per kilometer")]
#[command(version)]
pub struct Cli {
    /// Departure city (e.g., 'London')
    #[arg(long = "from", value_name = "CITY")]
    pub origin: String,
    /// Destination cities
    #[arg(long = "to", value_name = "CITY", required = true, num_args = 1..)]
    pub destinations: Vec<String>,
    /// Currency code [default: $DEFAULT_CURRENCY or USD]
    #[arg(long)]
    pub currency: Option<String>,
}

/// Prints progress the way the report reads: warnings and rows on stdout,
/// search failures on stderr. The first write error is kept and reported
/// once the run is over.
struct ConsoleReporter<O, E> {
    out: O,
    err: E,
    write_error: Option<io::Error>,
}

impl<O, E> ConsoleReporter<O, E> {
    fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            write_error: None,
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            self.write_error.get_or_insert(e);
        }
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn destination_unresolved(&mut self, name: &str, error: &FlightError) {
        let result = writeln!(self.out, "[warn] Skipping '{}': {}", name, error);
        self.record(result);
    }

    fn search_started(&mut self, origin: &Location) {
        let result = writeln!(self.out, "Origin: {} ({})", origin.name, origin.code)
            .and_then(|_| writeln!(self.out, "Searching cheapest $/km in the next ~24 hours...\n"));
        self.record(result);
    }

    fn fare_ranked(&mut self, origin: &Location, result: &RankedResult) {
        let written = writeln!(
            self.out,
            "- {} → {}: ${:.2} / {:.0}km = ${:.4}/km",
            origin.code,
            result.destination.code,
            result.fare.price,
            result.fare.distance_km,
            result.price_per_km
        );
        self.record(written);
    }

    fn no_flights(&mut self, origin: &Location, destination: &Location) {
        let result = writeln!(
            self.out,
            "[info] No flights found: {} → {}",
            origin.code, destination.code
        );
        self.record(result);
    }

    fn search_failed(&mut self, origin: &Location, destination: &Location, error: &FlightError) {
        let result = writeln!(
            self.err,
            "[warn] Failed {} → {}: {}",
            origin.code, destination.code, error
        );
        self.record(result);
    }
}

/// Writes the closing lines of the report and picks the exit code.
fn write_summary(
    result: Result<OptimizationOutcome, OptimizeError>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<u8> {
    match result {
        Ok(outcome) => {
            let best = &outcome.best;
            writeln!(out, "\n✅ Best destination: {}", best.destination.name)?;
            writeln!(out, "💲 Price per km: ${:.4}/km", best.price_per_km)?;
            writeln!(
                out,
                "(Cheapest fare: ${:.2} for ~{:.0} km; route {}→{})",
                best.fare.price, best.fare.distance_km, outcome.origin.code, best.destination.code
            )?;
            Ok(EXIT_OK)
        }
        Err(OptimizeError::OriginUnresolved { name, source }) => {
            writeln!(err, "[error] Failed to resolve origin '{}': {}", name, source)?;
            Ok(EXIT_ORIGIN_UNRESOLVED)
        }
        Err(OptimizeError::NoDestinationsResolved) => {
            writeln!(out, "[error] No destination cities could be resolved.")?;
            Ok(EXIT_NO_DESTINATIONS)
        }
        Err(e @ OptimizeError::NoFaresFound) => {
            writeln!(out, "\n{}", e)?;
            Ok(EXIT_NO_FARES)
        }
        // Only produced under the fail-fast policy, which the CLI does not use.
        Err(e @ OptimizeError::SearchFailed { .. }) => {
            writeln!(err, "[error] {}", e)?;
            Ok(EXIT_NO_FARES)
        }
    }
}

/// Runs one optimization and returns the process exit code, or the first
/// error hit while writing the report.
async fn run<O, E>(
    cli: &Cli,
    currency: &str,
    resolver: &dyn CityResolver,
    fares: &dyn FareSearch,
    out: O,
    err: E,
) -> io::Result<u8>
where
    O: Write + Send,
    E: Write + Send,
{
    let query = TripQuery {
        origin: cli.origin.clone(),
        destinations: cli.destinations.clone(),
        currency: currency.to_string(),
    };

    let mut reporter = ConsoleReporter::new(out, err);
    let result = Optimizer::new(resolver, fares).run(&query, &mut reporter).await;
    let ConsoleReporter {
        mut out,
        mut err,
        write_error,
    } = reporter;

    if let Some(e) = write_error {
        return Err(e);
    }
    let code = write_summary(result, &mut out, &mut err)?;
    out.flush()?;
    Ok(code)
}

fn init_logging() {
    // stdout carries the report; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[error] {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let client = match TequilaClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("[error] {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let currency = cli
        .currency
        .clone()
        .unwrap_or_else(|| config.default_currency.clone());

    match run(&cli, &currency, &client, &client, io::stdout(), io::stderr()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("[error] Failed to write report: {}", e);
            ExitCode::from(EXIT_CONFIG)
        }
    }
}
