use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;

use crate::dates::format_iso;
use crate::metrics::{DEFAULT_BODY_WEIGHT, daily_water_need, water_status};
use crate::models::{
    DEFAULT_GLASS_ML, UserProfile, UserProfileUpdate, WaterIntake, WaterIntakeStatus,
    WaterIntakeUpdate, validate_profile_update, validate_water_intake_update,
};
use crate::records::{new_id, now};
use crate::store::{Store, keys};

pub type WaterIntakeByDate = BTreeMap<String, WaterIntake>;

impl Store {
    // --- Profile ---

    pub fn get_profile(&self) -> Result<Option<UserProfile>> {
        self.read(keys::USER_PROFILE, None)
    }

    /// Create the profile on first call, otherwise overwrite the fields
    /// present in `update`.
    pub fn upsert_profile(&self, update: &UserProfileUpdate) -> Result<UserProfile> {
        let update = validate_profile_update(update)?;
        let now = now();
        let mut profile = self.get_profile()?.unwrap_or_else(|| UserProfile {
            id: new_id(),
            height: None,
            age: None,
            gender: None,
            activity_level: None,
            glass_size: DEFAULT_GLASS_ML,
            created_at: now.clone(),
            updated_at: now.clone(),
        });
        if update.height.is_some() {
            profile.height = update.height;
        }
        if update.age.is_some() {
            profile.age = update.age;
        }
        if update.gender.is_some() {
            profile.gender = update.gender;
        }
        if update.activity_level.is_some() {
            profile.activity_level = update.activity_level;
        }
        if let Some(ml) = update.glass_size {
            profile.glass_size = ml;
        }
        profile.updated_at = now;
        self.write(keys::USER_PROFILE, &profile)?;
        Ok(profile)
    }

    fn glass_size(&self) -> Result<u32> {
        Ok(self
            .get_profile()?
            .map_or(DEFAULT_GLASS_ML, |p| p.glass_size))
    }

    // --- Water intake ---

    pub fn get_all_water_intake(&self) -> Result<WaterIntakeByDate> {
        self.read(keys::WATER_INTAKE, BTreeMap::new())
    }

    pub fn get_water_intake(&self, date: NaiveDate) -> Result<Option<WaterIntake>> {
        Ok(self.get_all_water_intake()?.remove(&format_iso(date)))
    }

    /// Water goal for `date` from the latest weight on or before it and the
    /// profile's age and activity level.
    pub fn daily_water_goal(&self, date: NaiveDate) -> Result<u32> {
        let profile = self.get_profile()?;
        let weight = self
            .latest_weight_on_or_before(date)?
            .unwrap_or(DEFAULT_BODY_WEIGHT);
        Ok(daily_water_need(
            weight,
            profile.as_ref().and_then(|p| p.age),
            profile.as_ref().and_then(|p| p.activity_level),
        ))
    }

    /// Set glasses and/or glass size for `date`. The total and the daily goal
    /// are recomputed on every write.
    pub fn update_water_intake(
        &self,
        date: NaiveDate,
        update: &WaterIntakeUpdate,
    ) -> Result<WaterIntake> {
        validate_water_intake_update(update)?;
        let goal = self.daily_water_goal(date)?;
        let glass = self.glass_size()?;
        let mut all = self.get_all_water_intake()?;
        let now = now();
        let record = all
            .entry(format_iso(date))
            .or_insert_with(|| WaterIntake {
                id: new_id(),
                date,
                glasses_consumed: 0,
                ml_per_glass: glass,
                total_ml: 0,
                daily_goal_ml: goal,
                created_at: now.clone(),
                updated_at: now.clone(),
            });
        if let Some(glasses) = update.glasses_consumed {
            record.glasses_consumed = glasses;
        }
        if let Some(ml) = update.ml_per_glass {
            record.ml_per_glass = ml;
        }
        record.total_ml = record.glasses_consumed.saturating_mul(record.ml_per_glass);
        record.daily_goal_ml = goal;
        record.updated_at = now;
        let saved = record.clone();
        self.write(keys::WATER_INTAKE, &all)?;
        Ok(saved)
    }

    pub fn water_intake_status(&self, date: NaiveDate) -> Result<WaterIntakeStatus> {
        match self.get_water_intake(date)? {
            Some(intake) => Ok(water_status(
                Some(&intake),
                intake.daily_goal_ml,
                intake.ml_per_glass,
            )),
            None => Ok(water_status(
                None,
                self.daily_water_goal(date)?,
                self.glass_size()?,
            )),
        }
    }
}
