//! Per-user, per-course progress records.
//!
//! [`UserProgress`] owns every rule about how completion state changes. Stores
//! persist it and services orchestrate reads and writes, but neither decides
//! what the next state is.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CourseId, LessonId, ProgressKey, UserId};

/// Completion details for a single lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    /// When the lesson was first completed.
    pub completed_at: DateTime<Utc>,
    /// Seconds the student reported spending on the lesson.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u32>,
    /// Number of recorded completions.
    pub attempts: u32,
}

/// Result of recording a lesson completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The lesson was newly added to the completed set.
    Recorded {
        /// True when this completion finished the course.
        course_completed: bool,
    },
    /// The lesson was already complete; only access timestamps moved.
    AlreadyCompleted,
}

/// A user's completion state within one course.
///
/// ## Invariants
///
/// - `completed_lessons` holds no duplicates and keeps append order
/// - `progress_percentage == progress_percentage(completed_lessons.len(), total_lessons)`
/// - `is_completed == (progress_percentage >= 100)`
/// - `completed_at` is written once, on the first transition to completed
/// - `completed_lessons`, `session_count` and `total_time_spent` never shrink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Completed lesson IDs in the order they were completed.
    pub completed_lessons: Vec<LessonId>,
    /// Lesson count of the course when the record was created.
    pub total_lessons: u32,
    /// Rounded completion percentage, 0-100.
    pub progress_percentage: u8,
    pub lesson_progress: BTreeMap<LessonId, LessonProgress>,
    pub is_completed: bool,
    /// When the course was first completed.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Number of sessions that completed at least one new lesson.
    pub session_count: u32,
    /// Total reported seconds across completed lessons.
    pub total_time_spent: u64,
    /// Incremented on every mutation; used for conditional writes.
    #[serde(default)]
    pub revision: u64,
}

impl UserProgress {
    /// Create an empty progress record.
    ///
    /// `total_lessons` is snapshotted here and never refreshed afterwards.
    #[must_use]
    pub fn new(
        user_id: UserId,
        course_id: CourseId,
        total_lessons: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            course_id,
            completed_lessons: Vec::new(),
            total_lessons,
            progress_percentage: 0,
            lesson_progress: BTreeMap::new(),
            is_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
            last_accessed: now,
            session_count: 0,
            total_time_spent: 0,
            revision: 0,
        }
    }

    /// Storage key of this record.
    #[must_use]
    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(&self.user_id, &self.course_id)
    }

    /// Whether this record is the enrollment of `user_id` in `course_id`.
    ///
    /// Keys are `{user}_{course}`, so two enrollments can share a key when an
    /// ID contains `_`. Callers check ownership after every keyed lookup.
    #[must_use]
    pub fn belongs_to(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        &self.user_id == user_id && &self.course_id == course_id
    }

    /// Whether `lesson_id` has been completed.
    #[must_use]
    pub fn has_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    /// Record that `lesson_id` was completed at `now`.
    ///
    /// Completing an already-completed lesson only refreshes `updated_at` and
    /// `last_accessed`; the completed set, percentage, counters and
    /// `completed_at` stay exactly as they were.
    pub fn record_completion(
        &mut self,
        lesson_id: LessonId,
        time_spent: Option<u32>,
        now: DateTime<Utc>,
    ) -> CompletionOutcome {
        self.touch(now);

        if self.has_completed(&lesson_id) {
            return CompletionOutcome::AlreadyCompleted;
        }

        let was_completed = self.is_completed;

        self.lesson_progress.insert(
            lesson_id.clone(),
            LessonProgress {
                completed_at: now,
                time_spent,
                attempts: 1,
            },
        );
        self.completed_lessons.push(lesson_id);
        self.recompute();

        let course_completed = !was_completed && self.is_completed;
        if course_completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }

        self.session_count = self.session_count.saturating_add(1);
        self.total_time_spent = self
            .total_time_spent
            .saturating_add(u64::from(time_spent.unwrap_or(0)));

        CompletionOutcome::Recorded { course_completed }
    }

    /// Refresh the access timestamps without touching completion state.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.last_accessed = now;
        self.revision = self.revision.saturating_add(1);
    }

    /// Whether the derived fields agree with the completed set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        let unique = self.completed_lessons.iter().all(|id| seen.insert(id));

        unique
            && self.progress_percentage
                == progress_percentage(self.completed_lessons.len(), self.total_lessons)
            && self.is_completed == (self.progress_percentage >= 100)
    }

    fn recompute(&mut self) {
        let completed = self.completed_lessons.len();
        self.progress_percentage = progress_percentage(completed, self.total_lessons);
        self.is_completed = self.progress_percentage >= 100;
    }
}

/// Rounded completion percentage for `completed` of `total` lessons.
///
/// Rounds half up, the way course pages display it. An unfinished course never
/// reports 100: with more than 200 lessons, 199 of 200 would otherwise round up
/// and look complete. A course with no lessons reports 0.
#[must_use]
pub fn progress_percentage(completed: usize, total: u32) -> u8 {
    let total = u64::from(total);
    if total == 0 {
        return 0;
    }

    let completed = u64::try_from(completed).unwrap_or(u64::MAX);
    if completed >= total {
        return 100;
    }

    let rounded = (completed * 100 + total / 2) / total;
    u8::try_from(rounded.min(99)).unwrap_or(99)
}
