use std::env;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Sheets v4 REST API
    Sheets,
    /// In-process workbooks, lost on restart
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sheets_api_base_url: String,
    pub sheets_api_token: String,
    pub store_backend: StoreBackend,

    pub booking_workbook_id: String,
    pub roster_workbook_id: String,
    pub triage_workbook_id: String,

    pub slots_sheet: String,
    pub appointments_sheet: String,
    pub triage_sheet: String,

    pub roster_team_token: String,
    pub roster_template_token: String,
    pub roster_tab_suffix: Option<String>,
    pub reserved_keyword: String,
    pub remove_slot_on_marker_overwrite: bool,

    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheets_api_base_url: "https://sheets.googleapis.com".to_string(),
            sheets_api_token: String::new(),
            store_backend: StoreBackend::Sheets,
            booking_workbook_id: String::new(),
            roster_workbook_id: String::new(),
            triage_workbook_id: String::new(),
            slots_sheet: "Horarios".to_string(),
            appointments_sheet: "Agendamentos".to_string(),
            triage_sheet: "Triagem".to_string(),
            roster_team_token: "783".to_string(),
            roster_template_token: "modelo".to_string(),
            roster_tab_suffix: Some("B".to_string()),
            reserved_keyword: "reservado".to_string(),
            remove_slot_on_marker_overwrite: false,
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            sheets_api_base_url: env::var("SHEETS_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SHEETS_API_BASE_URL not set, using default");
                    defaults.sheets_api_base_url.clone()
                }),
            sheets_api_token: env::var("SHEETS_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SHEETS_API_TOKEN not set, using empty value");
                    String::new()
                }),
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("memory") => StoreBackend::Memory,
                Ok("sheets") | Err(_) => StoreBackend::Sheets,
                Ok(other) => {
                    warn!("Unknown STORE_BACKEND '{}', using sheets", other);
                    StoreBackend::Sheets
                }
            },
            booking_workbook_id: env::var("BOOKING_WORKBOOK_ID")
                .unwrap_or_else(|_| {
                    warn!("BOOKING_WORKBOOK_ID not set, using empty value");
                    String::new()
                }),
            roster_workbook_id: env::var("ROSTER_WORKBOOK_ID")
                .unwrap_or_else(|_| {
                    warn!("ROSTER_WORKBOOK_ID not set, using empty value");
                    String::new()
                }),
            triage_workbook_id: env::var("TRIAGE_WORKBOOK_ID")
                .unwrap_or_else(|_| {
                    warn!("TRIAGE_WORKBOOK_ID not set, using empty value");
                    String::new()
                }),
            slots_sheet: env::var("SLOTS_SHEET").unwrap_or(defaults.slots_sheet),
            appointments_sheet: env::var("APPOINTMENTS_SHEET").unwrap_or(defaults.appointments_sheet),
            triage_sheet: env::var("TRIAGE_SHEET").unwrap_or(defaults.triage_sheet),
            roster_team_token: env::var("ROSTER_TEAM_TOKEN").unwrap_or(defaults.roster_team_token),
            roster_template_token: env::var("ROSTER_TEMPLATE_TOKEN")
                .unwrap_or(defaults.roster_template_token),
            roster_tab_suffix: match env::var("ROSTER_TAB_SUFFIX") {
                Ok(suffix) if suffix.trim().is_empty() => None,
                Ok(suffix) => Some(suffix.trim().to_string()),
                Err(_) => defaults.roster_tab_suffix,
            },
            reserved_keyword: env::var("RESERVED_KEYWORD")
                .map(|k| k.trim().to_lowercase())
                .unwrap_or(defaults.reserved_keyword),
            remove_slot_on_marker_overwrite: env::var("REMOVE_SLOT_ON_MARKER_OVERWRITE")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            server_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.server_port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Whether every workbook the selected backend needs can be reached.
    pub fn is_configured(&self) -> bool {
        match self.store_backend {
            StoreBackend::Memory => true,
            StoreBackend::Sheets => {
                !self.sheets_api_token.is_empty()
                    && !self.booking_workbook_id.is_empty()
                    && !self.roster_workbook_id.is_empty()
            }
        }
    }

    pub fn is_triage_configured(&self) -> bool {
        self.store_backend == StoreBackend::Memory || !self.triage_workbook_id.is_empty()
    }
}
