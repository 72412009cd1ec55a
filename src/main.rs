use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod daylight;
mod ephemeris;
mod error;
mod geo;
mod output;
mod report;
mod sampler;
mod search;
mod time;

use cli::{Args, DepInfo};
use config::Config;
use ephemeris::SpaEphemeris;
use geo::GeoPoint;
use output::{print_day_report, print_sun_path};
use report::build_day_report;
use time::{TimezoneFinder, ZoneChoice, parse_date, resolve_zone};

// ===================== MAIN =====================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.show_build_info {
        return print_build_info();
    }

    // Defaults < config file < flags / environment
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;
    debug!(?config, "effective configuration");

    let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) else {
        return Err("--latitude and --longitude are required".into());
    };
    let location = GeoPoint::new(latitude, longitude)?;

    // Timezone is decided once; everything below only sees the resolved zone
    let choice = ZoneChoice::parse(&config.timezone.zone)?;
    let finder = TimezoneFinder::new();
    let zone = resolve_zone(choice, &location, &finder);

    // Anchor 'today' to the target timezone
    let date = parse_date(args.date.as_deref(), &zone.tz)?;

    let ephemeris = SpaEphemeris::for_date(date, config.observer.elevation_m, &config.atmosphere)?;
    let report = build_day_report(&ephemeris, location, date, zone, &config.search)?;

    print_day_report(&report);
    if let Some(minutes) = args.path {
        print_sun_path(&report, minutes);
    }

    Ok(())
}

/// Log to stderr; RUST_LOG wins, otherwise warnings only unless --verbose.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_build_info() -> Result<(), Box<dyn std::error::Error>> {
    println!("Built from Git commit: {}\n", env!("QIBLA_SHADOW_GIT_HASH"));
    const DEP_INFO_RAW: &str = include_str!(env!("QIBLA_SHADOW_DEPS_PATH"));
    let deps: Vec<DepInfo> = serde_json::from_str(DEP_INFO_RAW)?;

    println!("Found {} dependencies.", deps.len());
    for dep in deps {
        println!("- {} v{}", dep.name, dep.version);
        if let Some(sum) = dep.checksum {
            println!("    Checksum: {}", sum);
        }
        if let Some(src) = dep.source {
            println!("    Source:   {}", src);
        }
    }
    Ok(())
}
