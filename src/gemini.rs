use std::error::Error;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::distribution::{Committee, Observer, ObserverRole};

const GEMINI_MODEL: &str = "gemini-2.5-flash";

const SAMPLE_PROMPT: &str = r#"Generate sample data for a boys' high school exam session in Kuwait.
Respond with a single JSON object and nothing else, using exactly these keys:
{
  "teachers": [ { "name": "...", "department": "...", "role": "proctor" | "monitor" } ],
  "committees": [ { "name": "...", "sub_count": 8 } ],
  "schedule": [ { "day_of_week": "...", "date": "YYYY-MM-DD", "subject_10": "...",
                  "subject_11_sci": "...", "subject_11_arts": "...",
                  "subject_12_sci": "...", "subject_12_arts": "..." } ]
}
Rules:
- 70 teachers with full Arabic male names of at least three parts, departments
  spread over Math, Arabic, English, Science, Islamic Studies and Social
  Studies; exactly 6 senior teachers get role "monitor", the rest "proctor".
- Exactly 5 committees: Grade 10 with 8 sub-committees, Grade 11 Science
  with 6, Grade 11 Arts with 5, Grade 12 Science with 6, Grade 12 Arts with 5.
- 10 consecutive exam days starting on a Sunday, each with one subject per
  grade track."#;

/// One generated schedule day, merged positionally into the ten-day grid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleDay {
    #[serde(default)]
    pub day_of_week: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub subject_10: String,
    #[serde(default)]
    pub subject_11_sci: String,
    #[serde(default)]
    pub subject_11_arts: String,
    #[serde(default)]
    pub subject_12_sci: String,
    #[serde(default)]
    pub subject_12_arts: String,
}

#[derive(Debug, Deserialize)]
struct RawTeacher {
    name: String,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCommittee {
    name: String,
    #[serde(default)]
    sub_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    teachers: Vec<RawTeacher>,
    #[serde(default)]
    committees: Vec<RawCommittee>,
    #[serde(default)]
    schedule: Vec<SampleDay>,
}

/// A generated roster, committee set and schedule skeleton, ready to be
/// applied to the store as ordinary input data.
#[derive(Debug)]
pub struct SampleData {
    pub observers: Vec<Observer>,
    pub committees: Vec<Committee>,
    pub schedule: Vec<SampleDay>,
}

/// Calls the Gemini API and maps its JSON payload into domain records.
/// Any failure surfaces as one error; nothing is partially applied.
pub async fn generate_sample_data(api_key: &str) -> Result<SampleData, Box<dyn Error>> {
    let request_body = json!({
        "contents": [
            {
                "parts": [
                    { "text": SAMPLE_PROMPT }
                ]
            }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "temperature": 0.7
        }
    });

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        GEMINI_MODEL, api_key
    );

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&request_body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(format!("Gemini request failed with status {}", response.status()).into());
    }

    let response_json: serde_json::Value = response.json().await?;
    let text = response_json
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.get(0))
        .and_then(|part| part.get("text"))
        .and_then(|text| text.as_str())
        .ok_or("No content in Gemini response")?;

    let raw: RawSample = serde_json::from_str(text)?;
    let sample = map_sample(raw, chrono::Utc::now().timestamp_millis());
    info!(
        "generated sample data: {} observers, {} committees, {} schedule days",
        sample.observers.len(),
        sample.committees.len(),
        sample.schedule.len()
    );
    Ok(sample)
}

/// Stamps fresh ids onto the raw payload and normalizes roles and counts.
fn map_sample(raw: RawSample, stamp: i64) -> SampleData {
    let observers = raw
        .teachers
        .into_iter()
        .enumerate()
        .map(|(idx, teacher)| {
            let role = match teacher.role.as_deref() {
                Some(role) if role.eq_ignore_ascii_case("monitor") => ObserverRole::Monitor,
                _ => ObserverRole::Proctor,
            };
            Observer {
                id: format!("gen-{}-{}", idx, stamp),
                name: teacher.name,
                department: teacher.department.filter(|d| !d.is_empty()),
                role,
            }
        })
        .collect();

    let committees = raw
        .committees
        .into_iter()
        .enumerate()
        .map(|(idx, committee)| Committee {
            id: format!("comm-gen-{}-{}", idx, stamp),
            name: committee.name,
            sub_committees: committee.sub_count.unwrap_or(8),
            observers_per_room: 2,
            head_name: None,
            assistant1: None,
            assistant2: None,
        })
        .collect();

    SampleData {
        observers,
        committees,
        schedule: raw.schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_stamps_ids_and_normalizes_roles() {
        let raw = RawSample {
            teachers: vec![
                RawTeacher {
                    name: "Mohammed Ahmed Al-Kandari".to_string(),
                    department: Some("Math".to_string()),
                    role: Some("Monitor".to_string()),
                },
                RawTeacher {
                    name: "Khaled Hassan Al-Mutairi".to_string(),
                    department: Some(String::new()),
                    role: None,
                },
            ],
            committees: vec![RawCommittee {
                name: "Grade 10 Committee".to_string(),
                sub_count: None,
            }],
            schedule: vec![SampleDay::default()],
        };

        let sample = map_sample(raw, 500);

        assert_eq!(sample.observers[0].id, "gen-0-500");
        assert_eq!(sample.observers[0].role, ObserverRole::Monitor);
        assert_eq!(sample.observers[1].role, ObserverRole::Proctor);
        assert!(sample.observers[1].department.is_none());
        assert_eq!(sample.committees[0].id, "comm-gen-0-500");
        assert_eq!(sample.committees[0].sub_committees, 8);
        assert_eq!(sample.committees[0].observers_per_room, 2);
        assert_eq!(sample.schedule.len(), 1);
    }

    #[test]
    fn payload_text_parses_into_the_raw_shape() {
        let text = r#"{
            "teachers": [ { "name": "Ali Saad Al-Rashidi", "department": "Science", "role": "proctor" } ],
            "committees": [ { "name": "Grade 12 Science Committee", "sub_count": 6 } ],
            "schedule": [ { "day_of_week": "Sunday", "date": "2026-04-05", "subject_10": "Math",
                            "subject_11_sci": "Physics", "subject_11_arts": "History",
                            "subject_12_sci": "Chemistry", "subject_12_arts": "Geography" } ]
        }"#;

        let raw: RawSample = serde_json::from_str(text).unwrap();
        assert_eq!(raw.teachers.len(), 1);
        assert_eq!(raw.committees[0].sub_count, Some(6));
        assert_eq!(raw.schedule[0].subject_12_sci, "Chemistry");
    }
}
