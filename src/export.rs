use std::error::Error;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::distribution::{Committee, DayRecord, Observer, RoomAssignment};

/// Locations of the three sheets written for one day.
#[derive(Debug)]
pub struct ExportPaths {
    pub distribution: PathBuf,
    pub signatures: PathBuf,
    pub roster: PathBuf,
}

/// Writes one day's frozen result as three CSV sheets: the flat room
/// listing, the grouped signature sheet, and the monitors/reserves roster.
pub fn export_day(
    record: &DayRecord,
    committees: &[Committee],
    subject: &str,
    date: &str,
    day_name: &str,
    dir: &Path,
) -> Result<ExportPaths, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;

    let subject = if subject.is_empty() { "-" } else { subject };
    let date = if date.is_empty() { "-" } else { date };
    let day_name = if day_name.is_empty() { "-" } else { day_name };

    let paths = ExportPaths {
        distribution: dir.join("distribution.csv"),
        signatures: dir.join("signatures.csv"),
        roster: dir.join("monitors_reserves.csv"),
    };

    write_distribution_sheet(&paths.distribution, record, subject, date, day_name)?;
    write_signature_sheet(&paths.signatures, record, committees, subject, date, day_name)?;
    write_roster_sheet(&paths.roster, record, subject, date, day_name)?;

    Ok(paths)
}

/// Flat per-room listing, sorted by committee name then room number, with
/// two observer/signature column pairs and a spill column for a third.
fn write_distribution_sheet(
    path: &Path,
    record: &DayRecord,
    subject: &str,
    date: &str,
    day_name: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().from_path(path)?;

    wtr.write_record([
        "Day",
        "Date",
        "Subject",
        "Committee",
        "Room",
        "Observer 1",
        "Signature",
        "Observer 2",
        "Signature",
        "Observer 3",
    ])?;

    let mut sorted: Vec<&RoomAssignment> = record.rooms.iter().collect();
    sorted.sort_by(|a, b| {
        a.committee_name
            .cmp(&b.committee_name)
            .then(a.sub_committee.cmp(&b.sub_committee))
    });

    for room in sorted {
        let name_at = |idx: usize| {
            room.observers
                .get(idx)
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "-".to_string())
        };
        let third = room
            .observers
            .get(2)
            .map(|o| o.name.clone())
            .unwrap_or_default();
        wtr.write_record([
            day_name.to_string(),
            date.to_string(),
            subject.to_string(),
            room.committee_name.clone(),
            room.sub_committee.to_string(),
            name_at(0),
            String::new(),
            name_at(1),
            String::new(),
            third,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Signature sheet grouped per committee with the leadership header, then
/// monitor and reserve signature blocks. Rows vary in width, so the
/// writer runs in flexible mode.
fn write_signature_sheet(
    path: &Path,
    record: &DayRecord,
    committees: &[Committee],
    subject: &str,
    date: &str,
    day_name: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().flexible(true).from_path(path)?;

    wtr.write_record(["Signature sheet for committee staff"])?;
    wtr.write_record(["Day:", day_name, "Date:", date])?;
    wtr.write_record(["Subject:", subject])?;
    wtr.write_record([""])?;

    for committee in committees {
        wtr.write_record([format!(">>> {} <<<", committee.name)])?;
        wtr.write_record(["Committee head:", committee.head_name.as_deref().unwrap_or("-")])?;
        wtr.write_record(["First assistant:", committee.assistant1.as_deref().unwrap_or("-")])?;
        wtr.write_record(["Second assistant:", committee.assistant2.as_deref().unwrap_or("-")])?;
        wtr.write_record([""])?;

        let mut rooms: Vec<&RoomAssignment> = record
            .rooms
            .iter()
            .filter(|r| r.committee_name == committee.name)
            .collect();
        rooms.sort_by_key(|r| r.sub_committee);

        let width = rooms
            .iter()
            .map(|r| r.observers.len())
            .max()
            .unwrap_or(0)
            .max(2);

        let mut header = vec!["Room".to_string()];
        for i in 1..=width {
            header.push(format!("Observer {}", i));
            header.push(format!("Signature {}", i));
        }
        wtr.write_record(&header)?;

        if rooms.is_empty() {
            wtr.write_record(["No rooms assigned for this committee"])?;
        } else {
            for room in rooms {
                let mut row = vec![room.sub_committee.to_string()];
                for i in 0..width {
                    row.push(
                        room.observers
                            .get(i)
                            .map(|o| o.name.clone())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                    row.push(String::new());
                }
                wtr.write_record(&row)?;
            }
        }
        wtr.write_record([""])?;
    }

    wtr.write_record(["========================================"])?;
    wtr.write_record(["Monitor signatures (outside rooms)"])?;
    wtr.write_record(["#", "Name", "Department", "Signature"])?;
    write_signature_rows(&mut wtr, &record.monitors, "No monitors recorded")?;
    wtr.write_record([""])?;

    wtr.write_record(["========================================"])?;
    wtr.write_record(["Reserve signatures"])?;
    wtr.write_record(["#", "Name", "Department", "Signature"])?;
    write_signature_rows(&mut wtr, &record.reserves, "No reserves")?;

    wtr.flush()?;
    Ok(())
}

fn write_signature_rows<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    observers: &[Observer],
    empty_note: &str,
) -> Result<(), Box<dyn Error>> {
    if observers.is_empty() {
        wtr.write_record(["-", empty_note, "-", "-"])?;
        return Ok(());
    }
    for (idx, obs) in observers.iter().enumerate() {
        wtr.write_record([
            (idx + 1).to_string(),
            obs.name.clone(),
            obs.department.clone().unwrap_or_else(|| "-".to_string()),
            String::new(),
        ])?;
    }
    Ok(())
}

/// Formal monitors/reserves roster with duty and attendance columns.
fn write_roster_sheet(
    path: &Path,
    record: &DayRecord,
    subject: &str,
    date: &str,
    day_name: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().flexible(true).from_path(path)?;

    wtr.write_record(["Monitor and reserve duty roster"])?;
    wtr.write_record(["Day:", day_name, "Date:", date])?;
    wtr.write_record(["Subject:", subject])?;
    wtr.write_record([""])?;

    wtr.write_record(["Section one: committee monitors"])?;
    wtr.write_record([
        "#",
        "Full name",
        "Department",
        "Duty",
        "Attendance signature",
        "Notes",
    ])?;
    if record.monitors.is_empty() {
        wtr.write_record(["-", "No monitors recorded", "-", "-", "-", "-"])?;
    } else {
        for (idx, obs) in record.monitors.iter().enumerate() {
            wtr.write_record([
                (idx + 1).to_string(),
                obs.name.clone(),
                obs.department.clone().unwrap_or_else(|| "-".to_string()),
                "Committee monitor".to_string(),
                String::new(),
                String::new(),
            ])?;
        }
    }

    wtr.write_record([""])?;
    wtr.write_record(["Section two: reserve staff"])?;
    wtr.write_record([
        "#",
        "Full name",
        "Department",
        "Duty",
        "Attendance signature",
        "Directed to room",
    ])?;
    if record.reserves.is_empty() {
        wtr.write_record(["-", "No reserves", "-", "-", "-", "-"])?;
    } else {
        for (idx, obs) in record.reserves.iter().enumerate() {
            wtr.write_record([
                (idx + 1).to_string(),
                obs.name.clone(),
                obs.department.clone().unwrap_or_else(|| "-".to_string()),
                "Reserve".to_string(),
                String::new(),
                String::new(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
