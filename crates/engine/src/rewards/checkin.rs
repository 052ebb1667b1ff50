use crate::policy::CheckinBonus;
use crate::rewards::engine::RewardsEngine;
use crate::rewards::hooks::RewardEvent;
use carepoints_core::{
    mood_label, ActivityType, Badge, CheckinOutcome, CheckinRequest, DailyCheckin, Error,
    PointsOutcome, Result,
};
use carepoints_persistence::sqlite::{
    award_badge, get_checkin, list_badges, require_user, upsert_checkin,
};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

/// Streak lengths that earn a badge
pub const STREAK_MILESTONES: [i64; 5] = [7, 14, 30, 60, 100];

/// Mood-score daily check-in layered on the rewards engine
#[derive(Clone)]
pub struct CheckinService {
    engine: RewardsEngine,
}

impl CheckinService {
    pub fn new(engine: RewardsEngine) -> Self {
        Self { engine }
    }

    /// Save today's check-in, then award points for it.
    ///
    /// The check-in row is written before the award, so a failed award
    /// still leaves the check-in saved with a `Degraded` points outcome.
    /// A repeat on the same day updates the row and earns nothing.
    #[instrument(skip(self, request), fields(mood = request.mood_score))]
    pub async fn check_in(&self, user_id: &str, request: CheckinRequest) -> Result<CheckinOutcome> {
        let label = mood_label(request.mood_score).ok_or_else(|| {
            Error::ValidationError("mood score must be between 1 and 10".to_string())
        })?;

        let pool = self.engine.database().pool();
        require_user(pool, user_id).await?;

        let today = self.engine.clock().today();
        let existing = get_checkin(pool, user_id, today).await?;

        let mut checkin = DailyCheckin {
            user_id: user_id.to_string(),
            date: today,
            mood: request.mood_score,
            mood_label: label.to_string(),
            notes: request.notes.trim().to_string(),
            gratitude_note: request.gratitude.trim().to_string(),
            emotions: request.emotions.clone(),
            points: existing.as_ref().map(|c| c.points).unwrap_or(0),
            streak: existing.as_ref().map(|c| c.streak).unwrap_or(0),
        };
        upsert_checkin(pool, &checkin).await?;

        let bonus = CheckinBonus::for_request(&request);
        let points = self
            .engine
            .award_best_effort(user_id, ActivityType::Checkin, bonus.extras())
            .await;

        let mut new_badges = Vec::new();
        if let PointsOutcome::Awarded(result) = &points {
            checkin.points = result.final_points;
            checkin.streak = result.new_streak;
            if let Err(e) = upsert_checkin(pool, &checkin).await {
                warn!("Could not record points on check-in for {}: {}", user_id, e);
            }
            new_badges = self.award_streak_badges(user_id, result.new_streak).await;
        }

        if request.public_gratitude && !checkin.gratitude_note.is_empty() {
            self.engine.publish(RewardEvent::PublicGratitude {
                user_id: user_id.to_string(),
                date: today,
                gratitude: checkin.gratitude_note.clone(),
                mood_label: checkin.mood_label.clone(),
            });
        }

        info!(
            "Check-in saved for {} (mood {} {}, {} points)",
            user_id,
            checkin.mood,
            checkin.mood_label,
            points.points()
        );

        Ok(CheckinOutcome {
            checkin,
            points,
            new_badges,
        })
    }

    pub async fn get_checkin(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyCheckin>> {
        get_checkin(self.engine.database().pool(), user_id, date).await
    }

    pub async fn badges(&self, user_id: &str) -> Result<Vec<Badge>> {
        list_badges(self.engine.database().pool(), user_id).await
    }

    /// Record every milestone reached for the first time
    async fn award_streak_badges(&self, user_id: &str, streak: i64) -> Vec<Badge> {
        let pool = self.engine.database().pool();
        let mut earned = Vec::new();

        for days in STREAK_MILESTONES.iter().copied().filter(|d| streak >= *d) {
            let badge = Badge::streak_milestone(days);
            match award_badge(pool, user_id, &badge).await {
                Ok(true) => {
                    info!("{} earned badge {}", user_id, badge.badge_type);
                    self.engine.publish(RewardEvent::BadgeEarned {
                        user_id: user_id.to_string(),
                        badge: badge.clone(),
                    });
                    earned.push(badge);
                }
                Ok(false) => {}
                Err(e) => warn!("Badge {} not recorded for {}: {}", badge.badge_type, user_id, e),
            }
        }

        earned
    }
}
