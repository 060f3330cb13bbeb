use std::time::Duration;

use dlassist_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::CommandResult;

const BACKEND_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let (report, exit_code) = build_report();

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult::raw(exit_code, output);
    }

    CommandResult::raw(exit_code, render_human(&report))
}

fn build_report() -> (DoctorReport, u8) {
    let mut checks = Vec::new();

    let exit_code = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_backend_reachability(&config.backend.base_url));
            checks.push(check_assistant(&config));

            let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
            if all_pass {
                0
            } else {
                1
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["backend_reachability", "assistant_availability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
            2
        }
    };

    let overall_status = if exit_code == 0 { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if exit_code == 0 {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    (DoctorReport { overall_status, summary, checks }, exit_code)
}

/// Any HTTP answer counts as reachable; only transport failures fail the check.
fn check_backend_reachability(base_url: &str) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "backend_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(BACKEND_PROBE_TIMEOUT)
            .build()
            .map_err(|error| format!("failed to build HTTP client: {error}"))?;
        let response = client
            .get(base_url)
            .send()
            .await
            .map_err(|error| format!("backend at `{base_url}` is unreachable: {error}"))?;
        Ok::<u16, String>(response.status().as_u16())
    });

    match result {
        Ok(status) => DoctorCheck {
            name: "backend_reachability",
            status: CheckStatus::Pass,
            details: format!("backend at `{base_url}` answered with HTTP {status}"),
        },
        Err(error) => {
            DoctorCheck { name: "backend_reachability", status: CheckStatus::Fail, details: error }
        }
    }
}

fn check_assistant(config: &AppConfig) -> DoctorCheck {
    if config.assistant.is_configured() {
        DoctorCheck {
            name: "assistant_availability",
            status: CheckStatus::Pass,
            details: format!("assistant configured with model `{}`", config.assistant.model),
        }
    } else {
        DoctorCheck {
            name: "assistant_availability",
            status: CheckStatus::Skipped,
            details: "no assistant API key configured; free-text fallback uses canned replies"
                .to_string(),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
