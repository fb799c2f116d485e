#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// A stand-in for the field-operations service. GET endpoints answer with
/// fixture data, everything else with an empty object.
pub struct FixtureServer {
    server: Arc<tiny_http::Server>,
    port: u16,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl FixtureServer {
    pub fn start() -> Self {
        let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));

        {
            let server = Arc::clone(&server);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    request.as_reader().read_to_string(&mut body).ok();
                    let method = request.method().to_string();
                    let url = request.url().to_string();
                    let (status, payload) = route(&method, &url);
                    seen.lock().unwrap().push(Seen { method, url, body });

                    let header = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"application/json"[..],
                    )
                    .unwrap();
                    request
                        .respond(
                            tiny_http::Response::from_string(payload)
                                .with_status_code(status)
                                .with_header(header),
                        )
                        .ok();
                }
            });
        }

        Self { server, port, seen }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Seen> {
        self.requests()
            .into_iter()
            .filter(|seen| seen.method != "GET")
            .collect()
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("failed to run plm")
    }

    pub fn run_interactive(&self, input: &str) -> Output {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn interactive session");

        {
            let stdin = child.stdin.as_mut().expect("stdin");
            stdin
                .write_all(input.as_bytes())
                .expect("failed to write to stdin");
        }

        child
            .wait_with_output()
            .expect("failed to read interactive output")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_plm"));
        command
            .env("TZ", "UTC")
            .env("PLM_BASE_URL", self.base_url())
            .env("PLM_CONFIG_PATH", temp_path("missing-config.json"))
            .env_remove("PLM_LOG");
        command
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

pub fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("plm-{nanos}-{file_name}"))
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn route(method: &str, url: &str) -> (u16, String) {
    if method != "GET" {
        if url.ends_with("/999") {
            return (500, "record is locked".to_string());
        }
        return (200, "{}".to_string());
    }

    let body = match url.trim_start_matches('/') {
        "plm_tasks_matched" => serde_json::json!([
            {
                "id": 1, "fields_id": 10, "vehicles_id": 20, "attachments_id": 30,
                "description": "Pflügen", "duration": 7200,
                "begin": "2024-05-01T06:00:00Z", "end": "2024-05-01T08:00:00Z",
                "year": 2024, "crop_id": 5, "crop_name": "Mais",
                "field_info_id": 40, "field_id": 10, "field_info_begin": "2024-04-01T08:00:00Z"
            },
            {
                "id": 2, "fields_id": 11, "vehicles_id": 21, "attachments_id": 31,
                "description": "Eggen", "duration": 3600,
                "begin": "2024-05-03T08:00:00Z",
                "year": 2023, "crop_id": 6, "crop_name": "Weizen",
                "field_info_id": 41, "field_id": 11
            },
            {
                "id": 3, "fields_id": 10, "vehicles_id": 20, "attachments_id": 31,
                "description": "Walzen", "duration": 1800,
                "begin": "2023-09-10T10:00:00Z"
            }
        ]),
        "plm_fields" => serde_json::json!([
            { "id": 10, "name": "Acker", "farmId": 1, "farmName": "Hof Nord", "size": 4.0 },
            { "id": 11, "name": "Wiese", "farmId": 2, "farmName": "Hof Süd", "size": "2.5" }
        ]),
        "plm_vehicles" => serde_json::json!([
            { "id": 20, "name": "Fendt" },
            { "id": 21, "name": "Claas" }
        ]),
        "plm_attachments" => serde_json::json!([
            { "id": 30, "name": "Pflug" },
            { "id": 31, "name": "Egge" }
        ]),
        "plm_farms" => serde_json::json!([
            { "id": 1, "name": "Hof Nord" },
            { "id": 2, "name": "Hof Süd" }
        ]),
        "plm_crops" => serde_json::json!([
            { "crop_id": 5, "name": "Mais" },
            { "crop_id": 6, "name": "Weizen" }
        ]),
        "plm_years" => serde_json::json!([{ "year": 2023 }, { "year": 2024 }]),
        "plm_fieldinfo" => serde_json::json!([
            {
                "id": 40, "farm_name": "Hof Nord", "crop_name": "Mais", "crop_id": 5,
                "field_name": "Acker", "field_id": 10, "field_size": 4.0,
                "year": 2024, "begin_date": "2024-04-01T08:00:00Z"
            },
            {
                "id": 41, "farm_name": "Hof Süd", "crop_name": "Weizen", "crop_id": 6,
                "field_name": "Wiese", "field_id": 11, "field_size": "2.5",
                "year": 2023, "begin_date": "2023-03-15T07:30:00Z"
            },
            {
                "id": 999, "farm_name": "Hof Süd", "crop_name": "Weizen", "crop_id": 6,
                "field_name": "Wiese", "field_id": 11, "field_size": "2.5",
                "year": 2022, "begin_date": "2022-03-15T07:30:00Z"
            }
        ]),
        _ => return (404, "not found".to_string()),
    };

    (200, body.to_string())
}
