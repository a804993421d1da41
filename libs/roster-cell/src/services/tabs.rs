// libs/roster-cell/src/services/tabs.rs
use std::sync::{Arc, OnceLock};

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::{debug, instrument};

use shared_config::AppConfig;
use shared_database::{StoreError, TabularStore};
use shared_utils::datetime::work_week;

/// Which roster tabs carry live shifts.
#[derive(Debug, Clone)]
pub struct TabFilter {
    pub team_token: String,
    pub template_token: String,
    pub suffix: Option<String>,
}

impl TabFilter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            team_token: config.roster_team_token.clone(),
            template_token: config.roster_template_token.clone(),
            suffix: config.roster_tab_suffix.clone(),
        }
    }

    /// Team tab, not the template, and ending in the suffix tag when one is set.
    pub fn is_watched(&self, name: &str) -> bool {
        if !name.contains(&self.team_token) {
            return false;
        }
        if name.to_lowercase().contains(&self.template_token.to_lowercase()) {
            return false;
        }
        match &self.suffix {
            Some(suffix) => name.trim().ends_with(&format!(" {}", suffix)),
            None => true,
        }
    }
}

fn tab_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})/(\d{1,2})\s*-\s*(\d{1,2})/(\d{1,2})").expect("static pattern compiles")
    })
}

/// `(day, month)` bounds of the period written in a tab name.
pub fn parse_tab_range(name: &str) -> Option<((u32, u32), (u32, u32))> {
    let caps = tab_range_re().captures(name)?;
    let num = |idx: usize| caps[idx].parse::<u32>().ok();
    Some(((num(1)?, num(2)?), (num(3)?, num(4)?)))
}

/// Whether `(day, month)` falls inside the period, including periods that
/// run across a month or year boundary.
pub fn range_contains(start: (u32, u32), end: (u32, u32), target: (u32, u32)) -> bool {
    let ordinal = |(day, month): (u32, u32)| (month, day);
    let (start, end, target) = (ordinal(start), ordinal(end), ordinal(target));
    if start <= end {
        start <= target && target <= end
    } else {
        target >= start || target <= end
    }
}

/// Literal tab names the week of `date` is usually filed under, most common first.
pub fn candidate_tab_names(team: &str, suffix: Option<&str>, date: NaiveDate) -> Vec<String> {
    let (monday, friday) = work_week(date);
    let padded = (monday.format("%d/%m").to_string(), friday.format("%d/%m").to_string());
    let bare = (
        format!("{}/{}", monday.day(), monday.month()),
        format!("{}/{}", friday.day(), friday.month()),
    );

    let spans = [
        format!("{} - {}", padded.0, padded.1),
        format!("{}-{}", padded.0, padded.1),
        format!("{} - {}", bare.0, bare.1),
    ];

    let mut names: Vec<String> = Vec::new();
    for span in spans {
        let name = match suffix {
            Some(suffix) => format!("{} ({}) {}", team, span, suffix),
            None => format!("{} ({})", team, span),
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Finds the roster tab covering a date.
pub struct ShiftTabResolver {
    store: Arc<dyn TabularStore>,
    filter: TabFilter,
}

impl ShiftTabResolver {
    pub fn new(store: Arc<dyn TabularStore>, filter: TabFilter) -> Self {
        Self { store, filter }
    }

    /// Direct lookup of the guessed week names first, then a scan of every
    /// watched tab whose embedded period contains the date.
    #[instrument(skip(self))]
    pub async fn resolve(&self, date: NaiveDate) -> Result<Option<String>, StoreError> {
        for name in candidate_tab_names(&self.filter.team_token, self.filter.suffix.as_deref(), date) {
            if self.filter.is_watched(&name) && self.store.has_sheet(&name).await? {
                debug!("Roster tab resolved by name: {}", name);
                return Ok(Some(name));
            }
        }

        let target = (date.day(), date.month());
        let found = self
            .store
            .sheet_names()
            .await?
            .into_iter()
            .filter(|name| self.filter.is_watched(name))
            .find(|name| {
                parse_tab_range(name)
                    .map(|(start, end)| range_contains(start, end, target))
                    .unwrap_or(false)
            });

        match &found {
            Some(name) => debug!("Roster tab resolved by scan: {}", name),
            None => debug!("No roster tab covers {}", date),
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(suffix: Option<&str>) -> TabFilter {
        TabFilter {
            team_token: "783".to_string(),
            template_token: "modelo".to_string(),
            suffix: suffix.map(str::to_string),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn watched_tabs_need_team_suffix_and_no_template() {
        let f = filter(Some("B"));
        assert!(f.is_watched("783 (08/12 - 12/12) B"));
        assert!(f.is_watched("783 (08/12 - 12/12) B "));
        assert!(!f.is_watched("783 (08/12 - 12/12) A"));
        assert!(!f.is_watched("783 (08/12 - 12/12)"));
        assert!(!f.is_watched("783 (Modelo) B"));
        assert!(!f.is_watched("512 (08/12 - 12/12) B"));
    }

    #[test]
    fn without_suffix_any_team_tab_is_watched() {
        let f = filter(None);
        assert!(f.is_watched("783 (08/12 - 12/12)"));
        assert!(f.is_watched("783 (08/12 - 12/12) A"));
        assert!(!f.is_watched("783 modelo"));
    }

    #[test]
    fn tab_ranges_are_parsed() {
        assert_eq!(parse_tab_range("783 (08/12 - 12/12) B"), Some(((8, 12), (12, 12))));
        assert_eq!(parse_tab_range("783 (30/11-4/12) B"), Some(((30, 11), (4, 12))));
        assert_eq!(parse_tab_range("783 B"), None);
    }

    #[test]
    fn ranges_contain_dates_across_months_and_years() {
        assert!(range_contains((8, 12), (12, 12), (10, 12)));
        assert!(!range_contains((8, 12), (12, 12), (13, 12)));
        assert!(range_contains((30, 11), (4, 12), (1, 12)));
        assert!(range_contains((30, 11), (4, 12), (30, 11)));
        assert!(!range_contains((30, 11), (4, 12), (29, 11)));
        assert!(range_contains((29, 12), (2, 1), (31, 12)));
        assert!(range_contains((29, 12), (2, 1), (2, 1)));
        assert!(!range_contains((29, 12), (2, 1), (3, 1)));
    }

    #[test]
    fn candidate_names_cover_the_usual_spellings() {
        let names = candidate_tab_names("783", Some("B"), date(2025, 12, 10));
        assert_eq!(
            names,
            vec![
                "783 (08/12 - 12/12) B".to_string(),
                "783 (08/12-12/12) B".to_string(),
                "783 (8/12 - 12/12) B".to_string(),
            ]
        );

        let names = candidate_tab_names("783", None, date(2025, 12, 17));
        assert_eq!(names[0], "783 (15/12 - 19/12)");
        assert_eq!(names.len(), 2);
    }
}
