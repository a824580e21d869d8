use std::env;
use std::path::PathBuf;

use common::{LogEntry, LogLevel};
use library::{config_path_from_env, ConfigFile, Library};
use metadata::LoftyTagReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut json = false;
    let mut config_path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ => config_path = Some(PathBuf::from(arg)),
        }
    }
    let config_path = config_path.unwrap_or_else(config_path_from_env);
    info!("Using configuration {:?}", config_path);

    let library = Library::new(ConfigFile::new(config_path), LoftyTagReader::new());
    let subscription = library.log().subscribe();
    let stats = library.reload()?;
    let problems: Vec<LogEntry> = subscription
        .drain()
        .into_iter()
        .filter(|entry| entry.level() != LogLevel::Information)
        .collect();

    if json {
        let summary = serde_json::json!({
            "stats": stats,
            "total_files_count": library.total_files_count(),
            "album_artists": library.album_artists().len(),
            "albums": library.albums().len(),
            "genres": library.genres().len(),
            "performers": library.performers().len(),
            "problems": problems,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Scanned: {} album artists, {} albums, {} tracks ({} of {} files failed)",
        library.album_artists().len(),
        library.albums().len(),
        stats.tracks,
        stats.files_failed,
        library.total_files_count()
    );
    for entry in &problems {
        let path = entry.data("path").or_else(|| entry.data("root")).unwrap_or("-");
        println!("[{}] #{} {}: {}", entry.level(), entry.index(), entry.message(), path);
        if let Some(exception) = entry.data("exception") {
            println!("    {exception}");
        }
    }

    Ok(())
}
