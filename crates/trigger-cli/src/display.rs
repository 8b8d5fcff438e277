//! Status rendering for controller events

use trigger_core::{BroadcastEvent, PayloadKind, SessionSnapshot, TickReport};

use crate::error::Result;

/// Turns controller events into lines for the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusRenderer {
    json: bool,
}

impl StatusRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render_event(&self, event: &BroadcastEvent) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string(event)?);
        }

        let line = match event {
            BroadcastEvent::Activated { mode, report } => {
                format!("BROADCASTING ({})  {}", mode, status_line(report))
            }
            BroadcastEvent::ActivationFailed { mode, error } => {
                format!("TX FAILED ({}): Could not start BLE advertising: {}", mode, error)
            }
            BroadcastEvent::Tick(report) => status_line(report),
            BroadcastEvent::Deactivated {
                mode,
                total_transmissions,
            } => format!("Stopped {} after {} transmissions", mode, total_transmissions),
        };
        Ok(line)
    }

    pub fn render_snapshot(&self, snapshot: &SessionSnapshot) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string(snapshot)?);
        }

        let mode = match snapshot.mode.kind() {
            Some(kind) => kind.to_string(),
            None => "idle".to_string(),
        };
        Ok(format!(
            "Mode: {}  Active: {}  Position: {}  TX: {}  Fuzz: {}",
            mode,
            snapshot.is_active,
            snapshot.cycle_position,
            snapshot.total_transmissions,
            snapshot.current_fuzz_value
        ))
    }
}

fn status_line(report: &TickReport) -> String {
    let variant = match report.payload {
        PayloadKind::Original => "ORIGINAL",
        PayloadKind::Fuzzed(_) => "FUZZED",
    };
    let mut line = format!(
        "TX: {}  Mode: {}  Fuzz: {}",
        report.total_transmissions,
        variant,
        report.payload.fuzz_value()
    );
    if !report.last_attempt_succeeded {
        line.push_str("  (last attempt failed)");
    }
    line
}
