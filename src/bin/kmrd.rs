use clap::Parser;
use kmrd::dataset::{load_histories, load_rates, DatasetPaths, TextColumns};
use kmrd::source::Layout;
use kmrd::{build, cli};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Dataset error")]
    Dataset(#[from] kmrd::Error),
    #[error("Logging initialization error")]
    Log(#[from] log::SetLoggerError),
    #[error("Unknown user: {0}")]
    UnknownUser(u64),
}

fn main() -> Result<(), Error> {
    let opts: Opts = Opts::parse();
    cli::init_logging(opts.verbose)?;

    match opts.command {
        SubCommand::Build {
            config,
            data_dir,
            dataset_dir,
            min_count,
            volume_unit,
            layout,
            text_columns,
            utc_offset_hours,
            limit,
        } => {
            let mut settings = cli::load_build_config(config)?;

            if let Some(data_dir) = data_dir {
                settings.data_dir = data_dir.into();
            }
            if let Some(dataset_dir) = dataset_dir {
                settings.dataset_dir = dataset_dir.into();
            }
            if let Some(min_count) = min_count {
                settings.min_count = min_count;
            }
            if let Some(volume_unit) = volume_unit {
                settings.volume_unit = volume_unit;
            }
            if let Some(layout) = layout {
                settings.layout = layout;
            }
            if let Some(text_columns) = text_columns {
                settings.text_columns = text_columns;
            }
            if let Some(utc_offset_hours) = utc_offset_hours {
                settings.utc_offset_hours = utc_offset_hours;
            }
            if limit.is_some() {
                settings.limit = limit;
            }

            let report = build::build(&settings)?;
            println!("{}", report);
        }
        SubCommand::Describe {
            directory,
            size,
            force,
        } => {
            let paths = DatasetPaths::resolve(&directory, &size, force)?;
            let table = load_rates(&paths.rates)?;

            println!("Description of KMRD-{}", size);
            println!("{}", table.describe());
        }
        SubCommand::History {
            directory,
            size,
            user,
        } => {
            let paths = DatasetPaths::resolve(&directory, &size, false)?;
            let histories = load_histories(&paths.rates)?;
            let history = histories.get(&user).ok_or(Error::UnknownUser(user))?;

            println!("movie,rate,time");
            for (movie, rate, time) in history {
                println!("{},{},{}", movie, rate, time);
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[clap(name = "kmrd", version, author)]
struct Opts {
    /// Level of verbosity
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,
    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Build the filtered and full datasets from raw comment files
    Build {
        /// TOML config file
        #[clap(short, long)]
        config: Option<String>,
        /// Raw comment directory
        #[clap(long)]
        data_dir: Option<String>,
        /// Output dataset directory
        #[clap(long)]
        dataset_dir: Option<String>,
        /// Minimum number of ratings for a user to be in the filtered dataset
        #[clap(long)]
        min_count: Option<usize>,
        /// Row count unit used in full rates file names
        #[clap(long)]
        volume_unit: Option<usize>,
        /// Raw file layout (users or movies)
        #[clap(long)]
        layout: Option<Layout>,
        /// Text file columns (votes or rates)
        #[clap(long)]
        text_columns: Option<TextColumns>,
        /// UTC offset of scraped timestamps
        #[clap(long, allow_hyphen_values = true)]
        utc_offset_hours: Option<i32>,
        /// Only scan this many sources
        #[clap(long)]
        limit: Option<usize>,
    },
    /// Print shape and sparsity of a built dataset
    Describe {
        /// Dataset directory
        #[clap(short, long, default_value = "dataset")]
        directory: String,
        /// Dataset size (small, 2m, 5m)
        #[clap(short, long, default_value = "small")]
        size: String,
        /// Accept sizes other than the published ones
        #[clap(long)]
        force: bool,
    },
    /// Print one user's rating history
    History {
        /// Dataset directory
        #[clap(short, long, default_value = "dataset")]
        directory: String,
        /// Dataset size (small, 2m, 5m)
        #[clap(short, long, default_value = "small")]
        size: String,
        /// Final user index
        user: u64,
    },
}
