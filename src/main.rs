use clap::Parser;
use gemeinden::{CategoryFilter, Config, DatePolicy, TrackSource};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gemeinden")]
#[command(about = "Mark municipalities visited by GPS tracks and write them as GeoJSON", long_about = None)]
struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Municipal boundary shapefile (LV95)
    #[arg(long)]
    boundaries: Option<PathBuf>,

    /// Folder with tracks of activities already done
    #[arg(long)]
    done: Option<PathBuf>,

    /// Folder with planned routes
    #[arg(long)]
    planned: Option<PathBuf>,

    /// Only load done tracks of these categories (e.g. "hiking", "cycling")
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Keep every done track regardless of its file name
    #[arg(long, conflicts_with = "categories")]
    all_tracks: bool,

    /// How a track's date is determined: "first-point-timestamp" or "file-name-prefix"
    #[arg(long)]
    date_policy: Option<String>,

    /// Output for visited municipalities
    #[arg(long)]
    visited_out: Option<PathBuf>,

    /// Output for municipalities still to visit
    #[arg(long)]
    todo_out: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(boundaries) = self.boundaries {
            config.boundaries = boundaries;
        }
        if let Some(done) = self.done {
            config.done.dir = done;
        }
        if !self.categories.is_empty() {
            let filter = CategoryFilter::parse(&self.categories)?;
            config.done.categories = Some(filter.categories().to_vec());
        }
        if self.all_tracks {
            config.done.categories = None;
        }
        if let Some(planned) = self.planned {
            config.planned = Some(TrackSource::new(planned));
        }
        if let Some(policy) = self.date_policy {
            config.date_policy = policy.parse::<DatePolicy>()?;
        }
        if let Some(visited_out) = self.visited_out {
            config.visited_output = visited_out;
        }
        if let Some(todo_out) = self.todo_out {
            config.todo_output = todo_out;
        }

        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = cli.into_config()?;
    let summary = gemeinden::run(&config)?;

    info!("\n--- Summary ---");
    info!(
        "Done tracks: {}, planned tracks: {}",
        summary.done_tracks, summary.planned_tracks
    );
    info!(
        "Visited: {}, planned: {}, unvisited: {}",
        summary.municipalities.visited,
        summary.municipalities.planned,
        summary.municipalities.unvisited
    );

    Ok(())
}
