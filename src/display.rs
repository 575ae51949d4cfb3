use std::error::Error;
use std::fs::File;
use std::io::Write;

use crate::distribution::{DayRecord, ExamDay, Observer};

/// Formats an observer with the department tag used in printed lists.
pub fn format_observer(obs: &Observer) -> String {
    match &obs.department {
        Some(dept) => format!("{} ({})", obs.name, dept),
        None => obs.name.clone(),
    }
}

/// Prints one day's frozen result in a readable format.
pub fn print_day_result(day: &ExamDay, record: &DayRecord) {
    let heading = if day.day_of_week.is_empty() {
        day.label.clone()
    } else {
        format!("{} {}", day.day_of_week, day.display_date())
    };
    println!("\n=== {} ===", heading.trim());
    println!("Subjects: {}", day.subject_summary());
    println!("Rooms assigned: {}", record.rooms.len());

    for room in &record.rooms {
        let names: Vec<String> = room.observers.iter().map(format_observer).collect();
        println!(
            "  {} / room {} -> {}",
            room.committee_name,
            room.sub_committee,
            names.join(", ")
        );
    }

    println!("\nMonitors ({}):", record.monitors.len());
    for obs in &record.monitors {
        println!("  - {}", format_observer(obs));
    }

    println!("Reserves ({}):", record.reserves.len());
    for obs in &record.reserves {
        println!("  - {}", format_observer(obs));
    }
}

/// Writes the same listing to a plain text file.
pub fn write_day_result_to_file(
    day: &ExamDay,
    record: &DayRecord,
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(filename)?;

    writeln!(file, "** {} {} **", day.day_of_week, day.display_date())?;
    writeln!(file, "Subjects: {}", day.subject_summary())?;
    writeln!(file)?;

    for room in &record.rooms {
        let names: Vec<String> = room.observers.iter().map(format_observer).collect();
        writeln!(
            file,
            "{} / room {}: {}",
            room.committee_name,
            room.sub_committee,
            names.join(", ")
        )?;
    }

    writeln!(file)?;
    writeln!(file, "Monitors:")?;
    for obs in &record.monitors {
        writeln!(file, "  {}", format_observer(obs))?;
    }
    writeln!(file, "Reserves:")?;
    for obs in &record.reserves {
        writeln!(file, "  {}", format_observer(obs))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::ObserverRole;

    #[test]
    fn department_tag_is_optional() {
        let with_dept = Observer {
            id: "1".to_string(),
            name: "Ahmed Salem".to_string(),
            department: Some("Math".to_string()),
            role: ObserverRole::Proctor,
        };
        let without = Observer {
            department: None,
            ..with_dept.clone()
        };
        assert_eq!(format_observer(&with_dept), "Ahmed Salem (Math)");
        assert_eq!(format_observer(&without), "Ahmed Salem");
    }
}
