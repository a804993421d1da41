// libs/appointment-cell/tests/booking_test.rs
use assert_matches::assert_matches;

use appointment_cell::models::PatientDetails;
use appointment_cell::services::side_effects::{SideEffectError, SideEffectOutcome};
use appointment_cell::{BookSlotRequest, BookingError, BookingService, ScreeningType, TriageData};
use shared_database::{AppState, CellValue, TabularStore, Workbooks};
use shared_utils::test_utils::{roster_header, roster_tab_name, RosterRow, TestConfig, TestWorkbooks};
use slot_cell::SlotError;

const SLOTS: &str = "Horarios";
const APPOINTMENTS: &str = "Agendamentos";

struct Fixture {
    books: TestWorkbooks,
    tab: String,
}

impl Fixture {
    fn new() -> Self {
        let config = TestConfig::default().to_app_config();
        Self {
            books: TestWorkbooks::new(&config),
            tab: roster_tab_name("783", "08/12", "12/12", Some("B")),
        }
    }

    fn service(&self) -> BookingService {
        self.service_over(self.books.workbooks())
    }

    fn service_over(&self, workbooks: Workbooks) -> BookingService {
        let state = AppState::with_workbooks(TestConfig::default().to_app_config(), workbooks);
        BookingService::from_state(&state)
    }

    async fn roster_week(&self) {
        let rows = vec![
            roster_header(),
            RosterRow::new().date("12/12/2025").f("09:00", "reservado").build(),
            RosterRow::new().o("10:00", "reservado").build(),
        ];
        self.books.roster.add_sheet(&self.tab, rows).await;
    }

    async fn roster_cell(&self, row: usize, column: usize) -> String {
        self.books
            .roster
            .read_cell(&self.tab, row, column)
            .await
            .unwrap()
            .display_value()
    }

    async fn appointment_rows(&self) -> Vec<Vec<CellValue>> {
        self.books.booking.read_rows(APPOINTMENTS).await.unwrap()
    }
}

fn request(row_index: usize) -> BookSlotRequest {
    BookSlotRequest {
        row_index,
        name: "Ana Souza".to_string(),
        phone: "48999990000".to_string(),
        birth_date: "01/02/1995".to_string(),
        reason: "Consulta de rotina".to_string(),
        date: None,
        time: None,
        triage: None,
    }
}

#[tokio::test]
async fn booking_consumes_the_slot_and_logs_one_appointment() {
    let fx = Fixture::new();
    fx.roster_week().await;
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "09:00", "LIVRE", "F").await;

    let receipt = fx.service().book(request(row)).await.unwrap();

    assert!(receipt.confirmation.success);
    assert_eq!(receipt.confirmation.date, "12/12/2025");
    assert_eq!(receipt.confirmation.time, "09:00");

    let slots = fx.books.booking.read_rows(SLOTS).await.unwrap();
    assert_eq!(slots.len(), 1, "only the header should remain");

    let appointments = fx.appointment_rows().await;
    assert_eq!(appointments.len(), 2);
    let logged: Vec<String> = appointments[1][1..].iter().map(CellValue::display_value).collect();
    assert_eq!(
        logged,
        vec!["12/12/2025", "09:00", "Ana Souza", "01/02/1995", "Consulta de rotina", "48999990000"]
    );
    assert!(!appointments[1][0].is_empty());

    let outcomes = receipt.settle().await;
    assert_matches!(
        outcomes.as_slice(),
        [Ok(SideEffectOutcome::RosterFilled { row: 2, .. })]
    );
}

#[tokio::test]
async fn backfill_overwrites_the_f_marker() {
    let fx = Fixture::new();
    fx.roster_week().await;
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "9:00", "LIVRE", "F").await;

    fx.service().book(request(row)).await.unwrap().settle().await;

    assert_eq!(fx.roster_cell(2, 6).await, "Ana Souza");
    assert_eq!(fx.roster_cell(2, 7).await, "01/02/1995");
    assert_eq!(fx.roster_cell(2, 8).await, "Consulta de rotina");
    assert_eq!(fx.roster_cell(3, 15).await, "reservado");
}

#[tokio::test]
async fn backfill_overwrites_the_o_marker_and_tags_the_app() {
    let fx = Fixture::new();
    fx.roster_week().await;
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "10:00", "LIVRE", "O").await;

    fx.service().book(request(row)).await.unwrap().settle().await;

    assert_eq!(fx.roster_cell(3, 15).await, "Ana Souza");
    assert_eq!(fx.roster_cell(3, 16).await, "01/02/1995");
    assert_eq!(fx.roster_cell(3, 17).await, "Consulta de rotina");
    assert_eq!(fx.roster_cell(3, 13).await, "App");
    assert_eq!(fx.roster_cell(2, 6).await, "reservado");
}

#[tokio::test]
async fn taken_slot_is_a_conflict_and_changes_nothing() {
    let fx = Fixture::new();
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "09:00", "OCUPADO", "F").await;

    let result = fx.service().book(request(row)).await;

    assert_matches!(result, Err(BookingError::Slot(SlotError::Conflict)));
    assert_eq!(fx.books.booking.read_rows(SLOTS).await.unwrap().len(), 2);
    assert_eq!(fx.appointment_rows().await.len(), 1);
}

#[tokio::test]
async fn deleted_row_is_a_conflict_not_a_crash() {
    let fx = Fixture::new();

    let result = fx.service().book(request(9)).await;

    assert_matches!(result, Err(BookingError::Slot(SlotError::Conflict)));
    assert_eq!(fx.appointment_rows().await.len(), 1);
}

#[tokio::test]
async fn second_booking_of_the_same_slot_conflicts() {
    let fx = Fixture::new();
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "09:00", "LIVRE", "F").await;
    let service = fx.service();

    service.book(request(row)).await.unwrap();
    let again = service.book(request(row)).await;

    assert_matches!(again, Err(BookingError::Slot(SlotError::Conflict)));
    assert_eq!(fx.appointment_rows().await.len(), 2);
}

#[tokio::test]
async fn stale_row_index_never_books_the_slot_that_moved_into_it() {
    let fx = Fixture::new();
    let first = fx.books.seed_slot(SLOTS, "12/12/2025", "09:00", "LIVRE", "F").await;
    fx.books.seed_slot(SLOTS, "12/12/2025", "10:00", "LIVRE", "F").await;
    let service = fx.service();
    let picked = |row| BookSlotRequest {
        date: Some("12/12/2025".to_string()),
        time: Some("09:00".to_string()),
        ..request(row)
    };

    service.book(picked(first)).await.unwrap();
    let again = service.book(picked(first)).await;

    assert_matches!(again, Err(BookingError::Slot(SlotError::Conflict)));
    assert_eq!(fx.appointment_rows().await.len(), 2);
    let left = fx.books.booking.read_rows(SLOTS).await.unwrap();
    assert_eq!(left.len(), 2);
    assert_eq!(left[1][1].display_value(), "10:00");
}

#[tokio::test]
async fn failing_roster_never_fails_the_booking() {
    let fx = Fixture::new();
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "09:00", "LIVRE", "F").await;

    let receipt = fx
        .service_over(fx.books.workbooks_with_failing_roster())
        .book(request(row))
        .await
        .unwrap();

    assert!(receipt.confirmation.success);
    assert_eq!(fx.appointment_rows().await.len(), 2);
    assert_matches!(
        receipt.settle().await.as_slice(),
        [Err(SideEffectError::Store(_))]
    );
}

#[tokio::test]
async fn missing_roster_tab_is_reported_not_raised() {
    let fx = Fixture::new();
    let row = fx.books.seed_slot(SLOTS, "15/12/2025", "09:00", "LIVRE", "F").await;

    let outcomes = fx.service().book(request(row)).await.unwrap().settle().await;

    assert_matches!(outcomes.as_slice(), [Ok(SideEffectOutcome::RosterTabNotFound)]);
}

#[tokio::test]
async fn missing_marker_is_reported_not_raised() {
    let fx = Fixture::new();
    fx.roster_week().await;
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "14:00", "LIVRE", "F").await;

    let outcomes = fx.service().book(request(row)).await.unwrap().settle().await;

    assert_matches!(
        outcomes.as_slice(),
        [Ok(SideEffectOutcome::RosterMarkerNotFound { .. })]
    );
}

#[tokio::test]
async fn triage_is_recorded_alongside_the_booking() {
    let fx = Fixture::new();
    fx.roster_week().await;
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "10:00", "LIVRE", "O").await;
    let mut booking = request(row);
    booking.triage = Some(TriageData {
        screening: Some(ScreeningType::Prenatal),
        pregnancy_weeks: Some(20),
        first_visit: Some(true),
        ..TriageData::default()
    });

    let outcomes = fx.service().book(booking).await.unwrap().settle().await;

    assert_eq!(outcomes.len(), 2);
    assert_matches!(outcomes[1], Ok(SideEffectOutcome::TriageRecorded { row: 2 }));

    let triage = fx.books.triage.read_rows("Triagem").await.unwrap();
    assert_eq!(triage.len(), 2);
    assert_eq!(triage[1][2].display_value(), "Ana Souza");
    assert_eq!(triage[1][7].display_value(), "enfermeira");
    assert_eq!(triage[1][8].display_value(), "20");
    assert_eq!(triage[1][12].display_value(), "Sim");
}

#[tokio::test]
async fn blank_name_is_rejected_before_touching_the_slot() {
    let fx = Fixture::new();
    let row = fx.books.seed_slot(SLOTS, "12/12/2025", "09:00", "LIVRE", "F").await;
    let mut booking = request(row);
    booking.name = "   ".to_string();

    let result = fx.service().book(booking).await;

    assert_matches!(result, Err(BookingError::Validation(_)));
    assert_eq!(fx.books.booking.read_rows(SLOTS).await.unwrap().len(), 2);
}

#[test]
fn patient_details_are_trimmed() {
    let mut booking = request(2);
    booking.phone = " 48999990000 ".to_string();
    assert_eq!(
        booking.patient(),
        PatientDetails {
            name: "Ana Souza".to_string(),
            phone: "48999990000".to_string(),
            birth_date: "01/02/1995".to_string(),
            reason: "Consulta de rotina".to_string(),
        }
    );
}
