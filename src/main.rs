/// Station feed runner.
///
/// One run: load configuration, fetch and parse the configured feed, print
/// the console table, write `output.html`, optionally insert bike rows into
/// the database and open the document in a browser. Any fetch, parse or
/// configuration failure ends the run with exit code 1.

use std::error::Error;
use std::path::Path;

use station_feed::config::AppConfig;
use station_feed::db;
use station_feed::ingest::http::HttpSource;
use station_feed::list_model::StationList;
use station_feed::logging::{self, DataSource};
use station_feed::model::PipelineError;
use station_feed::pipeline;
use station_feed::render;

fn main() {
    dotenv::dotenv().ok();

    if let Err(e) = run() {
        if !already_logged(&*e) {
            logging::error(DataSource::System, None, &e.to_string());
        }
        eprintln!("station_feed: {}", e);
        std::process::exit(1);
    }
}

/// Pipeline failures are logged by `pipeline::run` where they happen.
fn already_logged(e: &(dyn Error + 'static)) -> bool {
    e.is::<PipelineError>()
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load_default()?;
    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    let profile = config.feed.profile;
    logging::info(
        DataSource::System,
        Some(profile.name),
        &format!("Fetching {}", profile.description),
    );

    let source = HttpSource::new(config.feed.timeout)?;
    let list = StationList::from_records(pipeline::run(&config.feed, &source)?);
    let records = list.records();

    if config.output.print_table {
        print!("{}", render::render_text_table(profile, &records));
    }

    let output = Path::new(&config.output.path);
    render::write_document(output, &render::render_document(profile, &records)?)?;

    if config.write_database {
        let conn = db::resolve_connection_string(|key| std::env::var(key).ok())?;
        let mut client = db::connect(&conn)?;
        db::ensure_table(&mut client)?;
        db::insert_stations(&mut client, &records)?;
    }

    if config.output.open_browser {
        render::open_in_browser(output);
    }

    Ok(())
}
