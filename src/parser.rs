use chrono::Utc;

use crate::distribution::{Observer, ObserverRole};

/// Maps a free-text role hint to a role. Monitor and reserve keywords are
/// recognized in English and Arabic; anything else is a regular proctor.
fn parse_role(hint: &str) -> ObserverRole {
    let lower = hint.trim().to_lowercase();
    if lower.contains("monitor") || lower.contains("مراقب") {
        ObserverRole::Monitor
    } else if lower.contains("reserve") || lower.contains("احتياط") {
        ObserverRole::Reserve
    } else {
        ObserverRole::Proctor
    }
}

/// Parses bulk roster text, one observer per line.
///
/// Each line holds a name plus optional department and role hint,
/// separated by comma, Arabic comma, or tab. Lines without a name are
/// skipped. Ids are stamped with the current time so repeated pastes
/// never collide.
pub fn parse_roster(text: &str) -> Vec<Observer> {
    parse_roster_with_stamp(text, Utc::now().timestamp_millis())
}

pub fn parse_roster_with_stamp(text: &str, stamp: i64) -> Vec<Observer> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let mut parts = line
                .split(|c: char| c == ',' || c == '،' || c == '\t')
                .map(str::trim);

            let name = parts.next().unwrap_or("");
            if name.is_empty() {
                return None;
            }
            let department = parts.next().filter(|d| !d.is_empty()).map(str::to_string);
            let role = parts.next().map(parse_role).unwrap_or(ObserverRole::Proctor);

            Some(Observer {
                id: format!("{}-{}", stamp, idx),
                name: name.to_string(),
                department,
                role,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_default_to_proctor() {
        let roster = parse_roster_with_stamp("Ahmed Salem\nKhaled Nasser", 1);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "Ahmed Salem");
        assert_eq!(roster[0].role, ObserverRole::Proctor);
        assert!(roster[0].department.is_none());
    }

    #[test]
    fn comma_fields_carry_department_and_role() {
        let roster = parse_roster_with_stamp("Ahmed Salem, Math, monitor", 1);
        assert_eq!(roster[0].department.as_deref(), Some("Math"));
        assert_eq!(roster[0].role, ObserverRole::Monitor);
    }

    #[test]
    fn tabs_and_arabic_commas_also_delimit() {
        let roster = parse_roster_with_stamp("A\tScience\treserve\nB، العربية، مراقب", 1);
        assert_eq!(roster[0].role, ObserverRole::Reserve);
        assert_eq!(roster[1].department.as_deref(), Some("العربية"));
        assert_eq!(roster[1].role, ObserverRole::Monitor);
    }

    #[test]
    fn arabic_reserve_hint_is_recognized() {
        let roster = parse_roster_with_stamp("Saad، الرياضيات، احتياطي", 1);
        assert_eq!(roster[0].role, ObserverRole::Reserve);
    }

    #[test]
    fn blank_and_nameless_lines_are_skipped() {
        let roster = parse_roster_with_stamp("\n   \n, Math, monitor\nValid Name", 1);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Valid Name");
    }

    #[test]
    fn ids_are_unique_within_one_paste() {
        let roster = parse_roster_with_stamp("A\nB\nC", 9);
        let ids: Vec<&str> = roster.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["9-0", "9-1", "9-2"]);
    }
}
