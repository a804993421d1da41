use std::sync::Arc;

use tracing::{info, warn};

use shared_config::{AppConfig, StoreBackend};

use crate::cell::{CellValue, Row};
use crate::memory::MemoryStore;
use crate::sheets::{SheetsClient, SheetsStore};
use crate::store::TabularStore;

pub const SLOTS_HEADER: [&str; 4] = ["Data", "Hora", "Status", "Origem"];

pub const APPOINTMENTS_HEADER: [&str; 7] = [
    "Timestamp",
    "Data",
    "Hora",
    "Nome",
    "Data de nascimento",
    "Observações",
    "Telefone",
];

pub const TRIAGE_HEADER: [&str; 16] = [
    "Timestamp",
    "Tipo",
    "Nome",
    "Data de nascimento",
    "Telefone",
    "Data da consulta",
    "Hora da consulta",
    "Profissional",
    "Semanas de gestação",
    "DUM",
    "Idade (meses)",
    "Nome do responsável",
    "Primeira consulta",
    "Data da última consulta",
    "Observações",
    "Origem",
];

pub fn header_row(labels: &[&str]) -> Row {
    labels.iter().map(|label| CellValue::text(*label)).collect()
}

/// The three independent workbooks the clinic works with.
#[derive(Clone)]
pub struct Workbooks {
    pub booking: Arc<dyn TabularStore>,
    pub roster: Arc<dyn TabularStore>,
    pub triage: Option<Arc<dyn TabularStore>>,
}

impl Workbooks {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory workbooks");
                Self::in_memory(config)
            }
            StoreBackend::Sheets => {
                let client = Arc::new(SheetsClient::new(config));
                let triage: Option<Arc<dyn TabularStore>> = if config.triage_workbook_id.is_empty() {
                    warn!("TRIAGE_WORKBOOK_ID not set, triage records will be skipped");
                    None
                } else {
                    Some(Arc::new(SheetsStore::new(client.clone(), &config.triage_workbook_id)))
                };
                Self {
                    booking: Arc::new(SheetsStore::new(client.clone(), &config.booking_workbook_id)),
                    roster: Arc::new(SheetsStore::new(client, &config.roster_workbook_id)),
                    triage,
                }
            }
        }
    }

    /// Empty workbooks carrying only the sheet headers. The roster starts
    /// with just its template tab.
    pub fn in_memory(config: &AppConfig) -> Self {
        let booking = MemoryStore::new("booking")
            .with_sheet(&config.slots_sheet, vec![header_row(&SLOTS_HEADER)])
            .with_sheet(&config.appointments_sheet, vec![header_row(&APPOINTMENTS_HEADER)]);
        let roster = MemoryStore::new("roster").with_sheet(
            format!("{} ({})", config.roster_team_token, config.roster_template_token),
            Vec::new(),
        );
        let triage = MemoryStore::new("triage")
            .with_sheet(&config.triage_sheet, vec![header_row(&TRIAGE_HEADER)]);

        Self {
            booking: Arc::new(booking),
            roster: Arc::new(roster),
            triage: Some(Arc::new(triage)),
        }
    }
}
