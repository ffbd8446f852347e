use std::process::exit;

use clap::Parser;
use rand::{SeedableRng, rngs::SmallRng};
use rusqlite::Connection;
use time::OffsetDateTime;

use tally_rs::{SEED_USER_ID, SeedConfig, initialize_db, seed_database};

/// A utility for filling a tally_rs database with generated development data.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// How many days of transactions to generate, ending today.
    #[arg(long, default_value_t = 90)]
    days: i64,
}

/// Replace the database contents with generated data for manual testing.
fn main() {
    let args = Args::parse();

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            eprintln!("Could not open database at {}: {error}", args.db_path);
            exit(1);
        }
    };

    if let Err(error) = initialize_db(&connection) {
        eprintln!("Could not initialize the database: {error}");
        exit(1);
    }

    let config = SeedConfig {
        end_date: OffsetDateTime::now_utc().date(),
        days: args.days,
    };
    let mut rng = SmallRng::from_entropy();

    match seed_database(&connection, &config, &mut rng) {
        Ok(count) => {
            println!("Seeded {count} transactions over {} days for {SEED_USER_ID}.", args.days + 1)
        }
        Err(error) => {
            eprintln!("Could not seed the database: {error}");
            exit(1);
        }
    }
}
