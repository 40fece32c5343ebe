//! Unit classification policy
//!
//! A [`Policy`] is derived per session from the congregation's household-type
//! options and settings. It decides whether a unit counts towards progress,
//! whether it is finished, and how it should be highlighted.
//!
//! Classification never fails: a unit the policy cannot interpret (unknown
//! status, missing tags, non-numeric not-home count) is treated as neither
//! countable nor completed.

use chrono::{DateTime, Utc};
use fieldwork_core::config::{EngineConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_TRIES};
use fieldwork_core::traits::{DocumentStore, UnitClassifier};
use fieldwork_core::types::{HouseholdTypeOption, LinkSession, LinkType, Role, Unit, UnitStatus};
use fieldwork_core::{paths, Direction, Query, Result};
use serde::Serialize;

/// Progress at or above which available units are highlighted.
pub const HIGHLIGHT_THRESHOLD: f64 = 90.0;

pub const COLOR_AVAILABLE: &str = "available";
pub const COLOR_AVAILABLE_HIGHLIGHT: &str = "available cell-highlight";

/// Per-session classification rules
#[derive(Debug, Clone, Serialize)]
pub struct Policy {
    user_name: String,
    origin: String,
    role: Role,
    max_tries: i64,
    /// Options ordered by display sequence
    options: Vec<HouseholdTypeOption>,
    countable_ids: Vec<String>,
    default_type_id: Option<String>,
    default_expiry_hours: u32,
}

impl Policy {
    /// Build a policy. `max_tries` and `default_expiry_hours` fall back to
    /// [`DEFAULT_MAX_TRIES`] and [`DEFAULT_EXPIRY_HOURS`].
    ///
    /// When several options are flagged default, the last one in `options`
    /// wins.
    pub fn new(
        user_name: impl Into<String>,
        options: Vec<HouseholdTypeOption>,
        max_tries: Option<i64>,
        origin: impl Into<String>,
        role_code: &str,
        default_expiry_hours: Option<u32>,
    ) -> Self {
        let mut countable_ids = Vec::new();
        let mut default_type_id = None;
        let mut default_count = 0usize;

        for option in &options {
            if option.is_countable {
                countable_ids.push(option.id.clone());
            }
            if option.is_default {
                default_count += 1;
                default_type_id = Some(option.id.clone());
            }
        }

        if default_count > 1 {
            // Upstream data issue: only one option should carry the flag.
            tracing::warn!(
                default_count,
                chosen = default_type_id.as_deref().unwrap_or_default(),
                "Multiple household types flagged default, using the last one"
            );
        }

        let mut options = options;
        options.sort_by_key(|o| o.sequence);

        Self {
            user_name: user_name.into(),
            origin: origin.into(),
            role: Role::from_code(role_code),
            max_tries: max_tries.unwrap_or(DEFAULT_MAX_TRIES),
            options,
            countable_ids,
            default_type_id,
            default_expiry_hours: default_expiry_hours.unwrap_or(DEFAULT_EXPIRY_HOURS),
        }
    }

    /// Build a policy from engine configuration.
    pub fn from_config(
        config: &EngineConfig,
        user_name: impl Into<String>,
        role_code: &str,
        options: Vec<HouseholdTypeOption>,
    ) -> Self {
        Self::new(
            user_name,
            options,
            Some(config.max_tries),
            config.origin.clone(),
            role_code,
            Some(config.expiry_hours),
        )
    }

    /// Status is in the countable set and at least one tag is a countable
    /// household type.
    pub fn is_countable(&self, unit: &Unit) -> bool {
        unit.status.is_countable()
            && !unit.types.is_empty()
            && unit.types.iter().any(|t| self.countable_ids.contains(t))
    }

    /// Done, or not-home with at least `max_tries` recorded attempts.
    pub fn is_completed(&self, unit: &Unit) -> bool {
        match unit.status {
            UnitStatus::Done => true,
            UnitStatus::NotHome => unit
                .not_home_tries()
                .is_some_and(|tries| tries >= self.max_tries),
            _ => false,
        }
    }

    /// CSS class for a unit cell given its address's progress percentage.
    pub fn unit_color(&self, unit: &Unit, progress: f64) -> &'static str {
        if self.is_completed(unit) || !self.is_countable(unit) {
            return "";
        }
        if progress < HIGHLIGHT_THRESHOLD {
            COLOR_AVAILABLE
        } else {
            COLOR_AVAILABLE_HIGHLIGHT
        }
    }

    /// Rounded percentage of countable units that are completed.
    pub fn aggregate_progress(&self, units: &[Unit]) -> u32 {
        UnitClassifier::aggregate_progress(self, units)
    }

    pub fn is_from_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Household types for a newly provisioned unit.
    pub fn default_types(&self) -> Vec<String> {
        self.default_type_id.iter().cloned().collect()
    }

    /// Expiry timestamp (epoch ms) for a link created at `now_ms`.
    pub fn link_expiry(&self, now_ms: i64, hours: Option<u32>) -> i64 {
        let hours = i64::from(hours.unwrap_or(self.default_expiry_hours));
        now_ms + hours * 3_600_000
    }

    /// New link for `map` published by this policy's user, expiring after
    /// `hours` or the policy default.
    pub fn new_link(
        &self,
        id: impl Into<String>,
        link_type: LinkType,
        map: impl Into<String>,
        now: DateTime<Utc>,
        hours: Option<u32>,
    ) -> LinkSession {
        let mut link = LinkSession::new(
            id,
            link_type,
            map,
            now,
            hours.unwrap_or(self.default_expiry_hours),
        );
        link.publisher_name = self.user_name.clone();
        link
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn max_tries(&self) -> i64 {
        self.max_tries
    }

    pub fn options(&self) -> &[HouseholdTypeOption] {
        &self.options
    }

    pub fn countable_ids(&self) -> &[String] {
        &self.countable_ids
    }

    pub fn default_type_id(&self) -> Option<&str> {
        self.default_type_id.as_deref()
    }

    pub fn default_expiry_hours(&self) -> u32 {
        self.default_expiry_hours
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new("", Vec::new(), None, "", "", None)
    }
}

impl UnitClassifier for Policy {
    fn is_countable(&self, unit: &Unit) -> bool {
        Policy::is_countable(self, unit)
    }

    fn is_completed(&self, unit: &Unit) -> bool {
        Policy::is_completed(self, unit)
    }
}

/// Read a congregation's household-type options, ordered by sequence.
pub async fn load_options(
    store: &dyn DocumentStore,
    congregation: &str,
) -> Result<Vec<HouseholdTypeOption>> {
    let query = Query::collection(paths::options(congregation)).order_by("sequence", Direction::Ascending);
    let docs = store.query(&query).await?;
    Ok(docs
        .iter()
        .map(|doc| HouseholdTypeOption::from_document(doc.id(), &doc.data))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<HouseholdTypeOption> {
        vec![
            HouseholdTypeOption::new("hdb", "HDB")
                .countable(true)
                .default_option(true)
                .with_sequence(1),
            HouseholdTypeOption::new("shop", "Shop").with_sequence(3),
            HouseholdTypeOption::new("condo", "Condo")
                .countable(true)
                .with_sequence(2),
        ]
    }

    fn policy() -> Policy {
        Policy::new("Alice", options(), Some(2), "https://example.org", "administrator", None)
    }

    fn countable_unit() -> Unit {
        Unit::new("u1", "01").with_types(["hdb"])
    }

    #[test]
    fn test_partitions_options() {
        let policy = policy();
        assert_eq!(policy.countable_ids(), ["hdb", "condo"]);
        assert_eq!(policy.default_type_id(), Some("hdb"));
        assert_eq!(policy.default_types(), vec!["hdb"]);
        let order: Vec<&str> = policy.options().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(order, vec!["hdb", "condo", "shop"]);
        assert_eq!(policy.default_expiry_hours(), DEFAULT_EXPIRY_HOURS);
    }

    #[test]
    fn test_last_default_wins() {
        let mut opts = options();
        opts.push(HouseholdTypeOption::new("landed", "Landed").default_option(true));
        let policy = Policy::new("Alice", opts, None, "", "conductor", None);
        assert_eq!(policy.default_type_id(), Some("landed"));
    }

    #[test]
    fn test_no_default() {
        let policy = Policy::new("Alice", vec![HouseholdTypeOption::new("a", "A")], None, "", "", None);
        assert_eq!(policy.default_type_id(), None);
        assert!(policy.default_types().is_empty());
        assert!(policy.countable_ids().is_empty());
        assert_eq!(policy.max_tries(), DEFAULT_MAX_TRIES);
    }

    #[test]
    fn test_countable_statuses() {
        let policy = policy();
        for status in [UnitStatus::Default, UnitStatus::Done, UnitStatus::NotHome] {
            assert!(policy.is_countable(&countable_unit().with_status(status)));
        }
        for status in [UnitStatus::DoNotCall, UnitStatus::Invalid] {
            assert!(!policy.is_countable(&countable_unit().with_status(status)));
            assert!(!policy.is_countable(
                &countable_unit().with_types(["hdb", "condo"]).with_status(status)
            ));
        }
    }

    #[test]
    fn test_countable_requires_countable_tag() {
        let policy = policy();
        assert!(!policy.is_countable(&Unit::new("u1", "01")));
        assert!(!policy.is_countable(&Unit::new("u1", "01").with_types(["shop"])));
        assert!(!policy.is_countable(&Unit::new("u1", "01").with_types(["deleted-option"])));
        assert!(policy.is_countable(&Unit::new("u1", "01").with_types(["shop", "condo"])));
    }

    #[test]
    fn test_completed_boundary() {
        let policy = policy();
        let not_home = countable_unit().with_status(UnitStatus::NotHome);

        assert!(policy.is_completed(&not_home.clone().with_nhcount(2)));
        assert!(policy.is_completed(&not_home.clone().with_nhcount(3)));
        assert!(!policy.is_completed(&not_home.clone().with_nhcount(1)));
        assert!(policy.is_completed(&countable_unit().with_status(UnitStatus::Done)));
        assert!(!policy.is_completed(&countable_unit()));
        // tries only matter for not-home units
        assert!(!policy.is_completed(
            &countable_unit().with_status(UnitStatus::DoNotCall).with_nhcount(9)
        ));
    }

    #[test]
    fn test_malformed_nhcount_is_not_completed() {
        let policy = policy();
        let not_home = countable_unit().with_status(UnitStatus::NotHome);

        assert!(!policy.is_completed(&not_home.clone().with_nhcount("")));
        assert!(!policy.is_completed(&not_home.clone().with_nhcount("many")));
        assert!(policy.is_completed(&not_home.with_nhcount("2 tries")));
    }

    #[test]
    fn test_unit_color() {
        let policy = policy();
        let available = countable_unit();

        assert_eq!(policy.unit_color(&available, 0.0), COLOR_AVAILABLE);
        assert_eq!(policy.unit_color(&available, 89.0), COLOR_AVAILABLE);
        assert_eq!(policy.unit_color(&available, 89.9), COLOR_AVAILABLE);
        assert_eq!(policy.unit_color(&available, 90.0), COLOR_AVAILABLE_HIGHLIGHT);
        assert_eq!(policy.unit_color(&available, 100.0), COLOR_AVAILABLE_HIGHLIGHT);

        let done = countable_unit().with_status(UnitStatus::Done);
        let untagged = Unit::new("u2", "02");
        for progress in [0.0, 50.0, 90.0, 100.0] {
            assert_eq!(policy.unit_color(&done, progress), "");
            assert_eq!(policy.unit_color(&untagged, progress), "");
        }
    }

    #[test]
    fn test_admin_roles() {
        let admin = |code: &str| Policy::new("A", Vec::new(), None, "", code, None).is_from_admin();
        assert!(admin("administrator"));
        assert!(admin("conductor"));
        assert!(admin("read_only"));
        assert!(!admin("publisher"));
        assert!(!admin("root"));
    }

    #[test]
    fn test_has_options() {
        assert!(policy().has_options());
        assert!(!Policy::default().has_options());
    }

    #[test]
    fn test_aggregate_progress() {
        let policy = policy();
        let units = vec![
            countable_unit().with_status(UnitStatus::Done),
            countable_unit().with_status(UnitStatus::NotHome).with_nhcount(2),
            countable_unit(),
            Unit::new("x", "9").with_types(["shop"]).with_status(UnitStatus::Done),
        ];
        // 2 of 3 countable units completed
        assert_eq!(policy.aggregate_progress(&units), 67);
        assert_eq!(policy.aggregate_progress(&[]), 0);
    }

    #[test]
    fn test_new_link_uses_policy_defaults() {
        let policy = policy();
        let now = DateTime::from_timestamp_millis(0).unwrap();
        let link = policy.new_link("l1", LinkType::Assignment, "m1", now, None);
        assert_eq!(link.publisher_name, "Alice");
        assert_eq!(link.end_timestamp, 24 * 3_600_000);

        let short = policy.new_link("l2", LinkType::Personal, "m1", now, Some(1));
        assert_eq!(short.end_timestamp, 3_600_000);
        assert_eq!(policy.link_expiry(1_000, Some(1)), short.end_timestamp + 1_000);
        assert_eq!(policy.link_expiry(0, None), link.end_timestamp);
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig::new()
            .with_max_tries(4)
            .with_expiry_hours(6)
            .with_origin("https://example.org");
        let policy = Policy::from_config(&config, "Bob", "2", options());
        assert_eq!(policy.max_tries(), 4);
        assert_eq!(policy.default_expiry_hours(), 6);
        assert_eq!(policy.origin(), "https://example.org");
        assert_eq!(policy.role(), Role::Conductor);
        assert_eq!(policy.user_name(), "Bob");
    }
}
