use anyhow::Result;
use dpclim::{Client, Dataset};
use std::path::Path;

fn main() -> Result<()> {
    // Example program that calls the library API end to end.
    // Configure authentication via env vars or a `.meteofrancerc` file.
    let client = Client::from_env()?;

    let department = "59";
    for station in client.list_stations(department)? {
        eprintln!("{} : {}", station.id, station.name);
    }

    let station = client.station_info("59343001")?;
    eprintln!("--- selected station ---");
    for (field, value) in station.metadata_fields() {
        eprintln!("{field:<10} : {value}");
    }

    // One order per year, as large ranges tend to be refused outright.
    let start_year = 2020;
    let end_year = 2021;
    let mut artifacts = Vec::new();
    for year in start_year..=end_year {
        eprintln!("placing order for {year}...");
        let order = client.submit_order(&station.id, year, year)?;
        eprintln!("order accepted: {order}");
        artifacts.push(client.download_order(&order, None)?);
    }

    let dataset = Dataset::from_artifacts(&artifacts)?.hourly_subset()?;
    eprintln!("--- missing data per parameter (%) ---");
    for (parameter, pct) in dataset.missing_percentages() {
        eprintln!("{parameter:<10} : {pct:.1}");
    }

    let locality = station.locality.clone().unwrap_or_default().replace(' ', "-");
    let out = format!("RAW_DATA_{}_{}_{start_year}-{end_year}.csv", station.id, locality);
    dataset.save_annotated(Path::new(&out), &station.metadata_fields())?;
    eprintln!("subset saved as {out}");

    for artifact in artifacts {
        std::fs::remove_file(artifact)?;
    }
    Ok(())
}
