use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::attendance::{GeofencePolicy, ShiftSchedule, SiteConfigProvider};
use crate::geo::Geofence;

const MIN_LOCATION_INTERVAL_MS: u64 = 250;
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    pub geofence: Option<Geofence>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeskSettings {
    pub sites: Vec<Site>,
    /// staff id -> site id
    pub staff_sites: HashMap<String, String>,
    pub shift: ShiftSchedule,
    /// Offset of the school's local time from UTC, used to pick the attendance day.
    pub utc_offset_minutes: i32,
    pub geofence_policy: GeofencePolicy,
    pub location_interval_ms: u64,
}

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            staff_sites: HashMap::new(),
            shift: ShiftSchedule::default(),
            utc_offset_minutes: 0,
            geofence_policy: GeofencePolicy::default(),
            location_interval_ms: 5_000,
        }
    }
}

impl DeskSettings {
    pub fn validate(&self) -> Result<()> {
        for site in &self.sites {
            if let Some(fence) = &site.geofence {
                if !fence.is_valid() {
                    bail!("site {} has an invalid geofence {:?}", site.id, fence);
                }
            }
        }
        for (staff_id, site_id) in &self.staff_sites {
            if !self.sites.iter().any(|site| &site.id == site_id) {
                bail!("staff {staff_id} is assigned to unknown site {site_id}");
            }
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            bail!("utc offset {} minutes is out of range", self.utc_offset_minutes);
        }
        if self.location_interval_ms < MIN_LOCATION_INTERVAL_MS {
            bail!(
                "location interval must be at least {MIN_LOCATION_INTERVAL_MS}ms, got {}",
                self.location_interval_ms
            );
        }
        Ok(())
    }

    pub fn site_for_staff(&self, staff_id: &str) -> Option<&Site> {
        let site_id = self.staff_sites.get(staff_id)?;
        self.sites.iter().find(|site| &site.id == site_id)
    }
}

/// JSON-backed desk configuration.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DeskSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            let parsed: DeskSettings = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
            parsed.validate()?;
            parsed
        } else {
            DeskSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> DeskSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: DeskSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn upsert_site(&self, site: Site) -> Result<()> {
        let mut next = self.snapshot();
        match next.sites.iter_mut().find(|existing| existing.id == site.id) {
            Some(existing) => *existing = site,
            None => next.sites.push(site),
        }
        self.update(next)
    }

    pub fn assign_staff(&self, staff_id: &str, site_id: &str) -> Result<()> {
        let mut next = self.snapshot();
        next.staff_sites
            .insert(staff_id.to_string(), site_id.to_string());
        self.update(next)
    }

    pub fn geofence_for_staff(&self, staff_id: &str) -> Option<Geofence> {
        self.read()
            .site_for_staff(staff_id)
            .and_then(|site| site.geofence)
    }

    pub fn shift(&self) -> ShiftSchedule {
        self.read().shift
    }

    pub fn geofence_policy(&self) -> GeofencePolicy {
        self.read().geofence_policy
    }

    pub fn utc_offset(&self) -> FixedOffset {
        let minutes = self.read().utc_offset_minutes;
        FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Sampling period, shortened to one second when `STAFFDESK_DEBUG` is set.
    pub fn location_interval(&self) -> Duration {
        let debug_mode = std::env::var("STAFFDESK_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            return Duration::from_secs(1);
        }
        Duration::from_millis(self.read().location_interval_ms)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: DeskSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &DeskSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, DeskSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DeskSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SiteConfigProvider for SettingsStore {
    async fn geofence_for(&self, staff_id: &str) -> Result<Option<Geofence>> {
        Ok(self.geofence_for_staff(staff_id))
    }
}
