//! Fixed seed dataset written on first use or after a reset.
//!
//! Two incidents (P1/Open with two notes, P3/Closed with one note) and two
//! runbooks, stamped relative to the supplied instant so every record keeps
//! `created_at <= updated_at` and notes stay newest first.

use crate::clock::Timestamp;
use crate::model::incident::{Incident, IncidentNote, IncidentStatus, Severity};
use crate::model::runbook::Runbook;
use crate::model::state::{AppState, SCHEMA_VERSION};
use chrono::Duration;
use uuid::Uuid;

/// Builds the seed state relative to `now`.
pub fn seed_state(now: Timestamp) -> AppState {
    let incident_created = now - Duration::hours(5);
    let incident_updated = now - Duration::hours(2);
    let secondary_created = now - Duration::hours(24);

    let incidents = vec![
        Incident {
            id: Uuid::new_v4(),
            title: "Checkout latency spikes in us-east-1".to_string(),
            severity: Severity::P1,
            status: IncidentStatus::Open,
            service: "Payments API".to_string(),
            created_at: incident_created,
            updated_at: incident_updated,
            notes: vec![
                IncidentNote {
                    timestamp: incident_updated,
                    author: "A. Rivera".to_string(),
                    text: "Rolled back to 2024.08.12 build; seeing partial recovery.".to_string(),
                },
                IncidentNote {
                    timestamp: incident_created,
                    author: "On-call Bot".to_string(),
                    text: "Pager triggered for elevated latency. Investigating recent deploy."
                        .to_string(),
                },
            ],
        },
        Incident {
            id: Uuid::new_v4(),
            title: "CI queue backlog for staging".to_string(),
            severity: Severity::P3,
            status: IncidentStatus::Closed,
            service: "CI Orchestrator".to_string(),
            created_at: secondary_created,
            updated_at: secondary_created,
            notes: vec![IncidentNote {
                timestamp: secondary_created,
                author: "L. Chen".to_string(),
                text: "Scaled runners and cleared backlog. Monitoring for recurrence.".to_string(),
            }],
        },
    ];

    let runbooks = vec![
        Runbook {
            id: Uuid::new_v4(),
            title: "Database failover checklist".to_string(),
            tags: vec![
                "database".to_string(),
                "failover".to_string(),
                "postgres".to_string(),
            ],
            content: "1. Confirm replica health\n2. Pause write-heavy jobs\n3. Promote replica\n4. Validate app connectivity".to_string(),
            created_at: secondary_created,
            updated_at: secondary_created,
        },
        Runbook {
            id: Uuid::new_v4(),
            title: "Cache eviction response".to_string(),
            tags: vec!["cache".to_string(), "redis".to_string()],
            content: "If cache eviction storms occur:\n- Increase memory threshold\n- Review key TTLs\n- Enable lazy freeing".to_string(),
            created_at: incident_created,
            updated_at: incident_created,
        },
    ];

    AppState {
        schema_version: SCHEMA_VERSION,
        incidents,
        runbooks,
    }
}
