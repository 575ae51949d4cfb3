use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::distribution::{Committee, ObserverRole, PinnedSeat};
use crate::export::export_day;
use crate::gemini::generate_sample_data;
use crate::parser::parse_roster;
use crate::store::{AppStore, CommitteeUpdate, DayUpdate};

/// Shared server state: the store behind a mutex plus the snapshot path.
pub struct AppData {
    pub store: Mutex<AppStore>,
    pub data_path: PathBuf,
}

/// Rewrites the snapshot after a mutation. Returns the error response to
/// send when the write fails.
fn persist(data: &AppData, store: &AppStore) -> Option<HttpResponse> {
    if let Err(e) = store.save(&data.data_path) {
        error!("failed to save data file: {}", e);
        return Some(HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": "Failed to save data"
        })));
    }
    None
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({"success": false, "error": message}))
}

// Full snapshot plus per-observer historical room counts
async fn get_state(data: web::Data<AppData>) -> Result<HttpResponse> {
    let store = data.store.lock().unwrap();
    let counts: HashMap<String, usize> = store
        .observers
        .iter()
        .map(|o| (o.id.clone(), store.observation_count(&o.id)))
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "state": &*store,
        "counts": counts
    })))
}

#[derive(Deserialize)]
pub struct BulkRequest {
    text: String,
}

// Bulk roster entry, one observer per line
async fn bulk_add_observers(
    req: web::Json<BulkRequest>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let parsed = parse_roster(&req.text);
    if parsed.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "No names found in the input"
        })));
    }

    let added = parsed.len();
    let mut store = data.store.lock().unwrap();
    store.add_observers(parsed);
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "added": added})))
}

async fn clear_observers(data: web::Data<AppData>) -> Result<HttpResponse> {
    let mut store = data.store.lock().unwrap();
    store.clear_observers();
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn remove_observer(
    path: web::Path<String>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let mut store = data.store.lock().unwrap();
    if !store.remove_observer(&path) {
        return Ok(not_found("Unknown observer"));
    }
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

#[derive(Deserialize)]
pub struct ObserverUpdateRequest {
    role: Option<ObserverRole>,
    department: Option<String>,
}

async fn update_observer(
    path: web::Path<String>,
    req: web::Json<ObserverUpdateRequest>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let mut store = data.store.lock().unwrap();
    if !store.update_observer(&path, req.role, req.department) {
        return Ok(not_found("Unknown observer"));
    }
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

#[derive(Deserialize)]
pub struct NewCommitteeRequest {
    name: String,
    sub_committees: u32,
    observers_per_room: Option<u32>,
    head_name: Option<String>,
    assistant1: Option<String>,
    assistant2: Option<String>,
}

async fn add_committee(
    req: web::Json<NewCommitteeRequest>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    if req.name.trim().is_empty() || req.sub_committees == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "A committee needs a name and at least one room"
        })));
    }

    let committee = Committee {
        id: format!("comm-{}", Utc::now().timestamp_millis()),
        name: req.name.trim().to_string(),
        sub_committees: req.sub_committees,
        observers_per_room: req.observers_per_room.unwrap_or(2),
        head_name: req.head_name.filter(|s| !s.is_empty()),
        assistant1: req.assistant1.filter(|s| !s.is_empty()),
        assistant2: req.assistant2.filter(|s| !s.is_empty()),
    };

    let mut store = data.store.lock().unwrap();
    store.add_committee(committee);
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn add_default_committees(data: web::Data<AppData>) -> Result<HttpResponse> {
    let mut store = data.store.lock().unwrap();
    store.add_default_committees();
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn remove_committee(
    path: web::Path<String>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let mut store = data.store.lock().unwrap();
    if !store.remove_committee(&path) {
        return Ok(not_found("Unknown committee"));
    }
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn update_committee(
    path: web::Path<String>,
    req: web::Json<CommitteeUpdate>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let mut store = data.store.lock().unwrap();
    if !store.update_committee(&path, req.into_inner()) {
        return Ok(not_found("Unknown committee"));
    }
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn update_schedule_day(
    path: web::Path<String>,
    req: web::Json<DayUpdate>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let mut store = data.store.lock().unwrap();
    if !store.update_day(&path, req.into_inner()) {
        return Ok(not_found("Unknown exam day"));
    }
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn toggle_absence(
    path: web::Path<(String, String)>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let (day_id, observer_id) = path.into_inner();
    let mut store = data.store.lock().unwrap();
    let absent = store.toggle_absence(&day_id, &observer_id);
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "absent": absent})))
}

async fn set_pin(
    path: web::Path<(String, String)>,
    req: web::Json<PinnedSeat>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let (day_id, observer_id) = path.into_inner();
    let mut store = data.store.lock().unwrap();
    match store.set_pin(&day_id, &observer_id, req.into_inner()) {
        Ok(()) => {
            if let Some(resp) = persist(&data, &store) {
                return Ok(resp);
            }
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
        }
        Err(msg) => Ok(HttpResponse::UnprocessableEntity()
            .json(serde_json::json!({"success": false, "error": msg}))),
    }
}

async fn clear_pin(
    path: web::Path<(String, String)>,
    data: web::Data<AppData>,
) -> Result<HttpResponse> {
    let (day_id, observer_id) = path.into_inner();
    let mut store = data.store.lock().unwrap();
    if !store.clear_pin(&day_id, &observer_id) {
        return Ok(not_found("No pin saved for this observer"));
    }
    if let Some(resp) = persist(&data, &store) {
        return Ok(resp);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

// The daily run: freezes the result as the day's history entry
async fn distribute(path: web::Path<String>, data: web::Data<AppData>) -> Result<HttpResponse> {
    let day_id = path.into_inner();
    let mut store = data.store.lock().unwrap();
    match store.run_day(&day_id, &mut rand::thread_rng()) {
        Ok(warning) => {
            if let Some(resp) = persist(&data, &store) {
                return Ok(resp);
            }
            info!("distribution saved for {}", day_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "warning": warning,
                "record": store.history.get(&day_id)
            })))
        }
        Err(msg) => Ok(HttpResponse::UnprocessableEntity()
            .json(serde_json::json!({"success": false, "error": msg}))),
    }
}

async fn get_result(path: web::Path<String>, data: web::Data<AppData>) -> Result<HttpResponse> {
    let store = data.store.lock().unwrap();
    match store.history.get(path.as_str()) {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(not_found("No saved result for this day")),
    }
}

async fn export_result(path: web::Path<String>, data: web::Data<AppData>) -> Result<HttpResponse> {
    let day_id = path.into_inner();
    let store = data.store.lock().unwrap();

    let day = match store.day(&day_id) {
        Some(day) => day,
        None => return Ok(not_found("Unknown exam day")),
    };
    let record = match store.history.get(&day_id) {
        Some(record) => record,
        None => return Ok(not_found("Run the distribution for this day first")),
    };

    let day_name = if day.day_of_week.is_empty() {
        day.label.clone()
    } else {
        day.day_of_week.clone()
    };
    let dir = PathBuf::from("exports").join(&day_id);

    match export_day(
        record,
        &store.committees,
        &day.subject_summary(),
        &day.display_date(),
        &day_name,
        &dir,
    ) {
        Ok(paths) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "files": [
                paths.distribution.to_string_lossy(),
                paths.signatures.to_string_lossy(),
                paths.roster.to_string_lossy()
            ]
        }))),
        Err(e) => {
            error!("export failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Failed to write the export sheets"
            })))
        }
    }
}

// Sample data from Gemini; nothing is written when the call fails
async fn generate_sample(data: web::Data<AppData>) -> Result<HttpResponse> {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            return Ok(HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "success": false,
                "error": "GEMINI_API_KEY is not set"
            })))
        }
    };

    match generate_sample_data(&api_key).await {
        Ok(sample) => {
            let mut store = data.store.lock().unwrap();
            store.apply_sample(sample);
            if let Some(resp) = persist(&data, &store) {
                return Ok(resp);
            }
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "observers": store.observers.len(),
                "committees": store.committees.len()
            })))
        }
        Err(e) => {
            error!("sample data generation failed: {}", e);
            Ok(HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": "Sample data generation failed; check the API key and try again"
            })))
        }
    }
}

// HTML page handler
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

pub async fn start_server(port: u16, data_path: PathBuf) -> std::io::Result<()> {
    let store = AppStore::load(&data_path);
    info!(
        "loaded {} observers and {} committees from {}",
        store.observers.len(),
        store.committees.len(),
        data_path.display()
    );

    let app_data = web::Data::new(AppData {
        store: Mutex::new(store),
        data_path,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(index))
            .route("/api/state", web::get().to(get_state))
            .route("/api/observers/bulk", web::post().to(bulk_add_observers))
            .route("/api/observers/clear", web::post().to(clear_observers))
            .route("/api/observers/{id}", web::delete().to(remove_observer))
            .route("/api/observers/{id}", web::put().to(update_observer))
            .route("/api/committees", web::post().to(add_committee))
            .route("/api/committees/defaults", web::post().to(add_default_committees))
            .route("/api/committees/{id}", web::delete().to(remove_committee))
            .route("/api/committees/{id}", web::put().to(update_committee))
            .route("/api/schedule/{day_id}", web::put().to(update_schedule_day))
            .route(
                "/api/days/{day_id}/absence/{observer_id}",
                web::post().to(toggle_absence),
            )
            .route(
                "/api/days/{day_id}/pins/{observer_id}",
                web::put().to(set_pin),
            )
            .route(
                "/api/days/{day_id}/pins/{observer_id}",
                web::delete().to(clear_pin),
            )
            .route("/api/days/{day_id}/distribute", web::post().to(distribute))
            .route("/api/days/{day_id}/result", web::get().to(get_result))
            .route("/api/days/{day_id}/export", web::get().to(export_result))
            .route("/api/sample", web::post().to(generate_sample))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
