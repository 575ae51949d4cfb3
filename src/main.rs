mod display;
mod distribution;
mod export;
mod gemini;
mod logging;
mod parser;
mod store;
mod web;

use std::path::PathBuf;

use store::AppStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let data_path = PathBuf::from(
        std::env::var("OBSERVER_DATA").unwrap_or_else(|_| store::DEFAULT_DATA_FILE.to_string()),
    );

    match args.get(1).map(String::as_str) {
        Some("web") => {
            let port = args
                .get(2)
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);

            println!("Starting web server on port {}...", port);
            println!("Access the site at http://localhost:{}", port);

            web::start_server(port, data_path).await?;
        }
        Some("distribute") => {
            let day_id = args.get(2).map(String::as_str).unwrap_or("day-1");
            let mut store = AppStore::load(&data_path);

            match store.run_day(day_id, &mut rand::thread_rng()) {
                Ok(warning) => {
                    if let Some(warning) = warning {
                        println!("Warning: {}", warning);
                    }
                    store.save(&data_path)?;

                    if let (Some(day), Some(record)) =
                        (store.day(day_id), store.history.get(day_id))
                    {
                        display::print_day_result(day, record);

                        let filename = format!("{}_result.txt", day_id);
                        display::write_day_result_to_file(day, record, &filename)?;
                        println!("\nResult saved to {}", filename);
                    }
                }
                Err(msg) => println!("Cannot distribute: {}", msg),
            }
        }
        Some("export") => {
            let day_id = args.get(2).map(String::as_str).unwrap_or("day-1");
            let store = AppStore::load(&data_path);

            match (store.day(day_id), store.history.get(day_id)) {
                (Some(day), Some(record)) => {
                    let day_name = if day.day_of_week.is_empty() {
                        day.label.clone()
                    } else {
                        day.day_of_week.clone()
                    };
                    let dir = PathBuf::from("exports").join(day_id);
                    let paths = export::export_day(
                        record,
                        &store.committees,
                        &day.subject_summary(),
                        &day.display_date(),
                        &day_name,
                        &dir,
                    )?;

                    println!("Sheets written to:");
                    println!("  - {}", paths.distribution.display());
                    println!("  - {}", paths.signatures.display());
                    println!("  - {}", paths.roster.display());
                }
                _ => println!(
                    "No saved result for {}; run `distribute {}` first",
                    day_id, day_id
                ),
            }
        }
        Some("sample") => {
            let api_key = match std::env::var("GEMINI_API_KEY") {
                Ok(key) => key,
                Err(_) => {
                    println!("Set GEMINI_API_KEY to generate sample data");
                    return Ok(());
                }
            };

            println!("Requesting sample data from Gemini...");
            let sample = gemini::generate_sample_data(&api_key).await?;

            let mut store = AppStore::load(&data_path);
            store.apply_sample(sample);
            store.save(&data_path)?;

            println!(
                "Sample data saved: {} observers, {} committees",
                store.observers.len(),
                store.committees.len()
            );
        }
        Some("seed-committees") => {
            let mut store = AppStore::load(&data_path);
            store.add_default_committees();
            store.save(&data_path)?;
            println!("Added the five standard grade committees");
        }
        _ => {
            println!("Usage:");
            println!("  observer-distribution web [port]        start the web interface");
            println!("  observer-distribution distribute <day>  run a day's distribution (day-1..day-10)");
            println!("  observer-distribution export <day>      write the CSV sheets for a saved day");
            println!("  observer-distribution sample            fetch generated sample data (GEMINI_API_KEY)");
            println!("  observer-distribution seed-committees   add the five standard grade committees");
        }
    }

    Ok(())
}
