mod config;
mod report;

use std::time::Duration;

use scaling::{check_executable, plot, store, Error, ProcessExecutor, Sweep};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{Options, Parsed};

fn run(options: &Options) -> Result<(), Error> {
    let reference = options.reference.name();

    if let Some(path) = &options.replot {
        let result = store::load(path)?;
        for written in plot::render_all(&result, &options.out_dir, reference)? {
            println!("Saved plot to {}", written.display());
        }
        return Ok(());
    }

    let settings = &options.settings;
    if !settings.integrands.contains(&options.reference) {
        return Err(Error::InvalidConfig(format!(
            "reference integrand '{}' is not among the swept functions",
            reference
        )));
    }

    check_executable(&options.executable)?;

    let sweep = Sweep::new(settings)?;
    let mut executor = ProcessExecutor::new(&options.executable, settings.env.clone())
        .with_timeout(settings.timeout_ms.map(Duration::from_millis));

    info!(
        exe = %options.executable.display(),
        cells = settings.cell_count(),
        repeat = settings.repeat,
        "starting sweep"
    );
    let result = sweep.run_with(&mut executor, |p| println!("{}", report::progress_line(p)))?;
    report::print_table(&result);

    let json = options.out_dir.join(store::RESULTS_FILE);
    store::save(&result, &json)?;
    println!("Saved results to {}", json.display());

    for written in plot::render_all(&result, &options.out_dir, reference)? {
        println!("Saved plot to {}", written.display());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = match config::parse_args(args.get(1..).unwrap_or_default()) {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Help) => {
            config::print_usage();
            return;
        }
        Err(msg) => {
            eprintln!("{}", msg);
            config::print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&options) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        if matches!(e, Error::MissingExecutable { .. }) {
            eprintln!("Build the integrator first (e.g. with `make`) or pass --exe <path>.");
        }
        std::process::exit(1);
    }
}
