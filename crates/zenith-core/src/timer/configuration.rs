use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One named block of the sequence: repeated work items plus an optional rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSegment {
    pub name: String,
    /// Instructions, one per work item. Each lasts `time` seconds.
    pub work: Vec<String>,
    /// Duration in seconds of every work item in this segment.
    pub time: u32,
    /// Trailing rest in seconds. `0` means no rest phase.
    #[serde(default)]
    pub rest: u32,
    #[serde(default)]
    pub rest_string: String,
}

impl TimerSegment {
    /// Seconds spent in this segment: all work items plus the trailing rest.
    pub fn duration_secs(&self) -> u64 {
        (self.work.len() as u64)
            .saturating_mul(self.time as u64)
            .saturating_add(self.rest as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfiguration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub segments: Vec<TimerSegment>,
    /// Rest in seconds between full passes when `repeat` is set.
    #[serde(default)]
    pub rest_between_sections: u32,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom: Option<bool>,
}

impl TimerConfiguration {
    /// Check that the configuration can be run.
    ///
    /// Every segment needs at least one work item and a positive `time`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.segments.is_empty() {
            return Err(ValidationError::NoSegments {
                id: self.id.clone(),
            });
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.work.is_empty() {
                return Err(ValidationError::EmptyWork {
                    index,
                    name: segment.name.clone(),
                });
            }
            if segment.time == 0 {
                return Err(ValidationError::ZeroDuration {
                    index,
                    name: segment.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Duration of the very first phase (segment 0, work item 0).
    pub fn first_phase_secs(&self) -> u32 {
        self.segments.first().map(|s| s.time).unwrap_or(0)
    }

    /// Total number of work items across all segments.
    pub fn work_item_count(&self) -> usize {
        self.segments.iter().map(|s| s.work.len()).sum()
    }

    /// Seconds for one pass through every segment.
    ///
    /// Includes the between-cycle rest when the sequence repeats.
    pub fn cycle_duration_secs(&self) -> u64 {
        let segments: u64 = self.segments.iter().map(TimerSegment::duration_secs).sum();
        if self.repeat {
            segments.saturating_add(self.rest_between_sections as u64)
        } else {
            segments
        }
    }

    pub fn is_custom(&self) -> bool {
        self.is_custom.unwrap_or(false)
    }

    /// Templates shipped with the application.
    pub fn builtin_templates() -> Vec<Self> {
        vec![
            Self {
                id: "twenty-twenty-twenty".into(),
                name: "20-20-20 Eye Relief".into(),
                description: "For every 20 minutes of screen time, take a 20-second break to look \
                              at something 20 feet away. Helps reduce eye strain."
                    .into(),
                segments: vec![
                    TimerSegment {
                        name: "Focus Work".into(),
                        work: vec!["Deep work session. Focus on your current task.".into()],
                        time: 20 * 60,
                        rest: 0,
                        rest_string: "Prepare for eye break".into(),
                    },
                    TimerSegment {
                        name: "Eye Break".into(),
                        work: vec!["Look at an object at least 20 feet (6 meters) away.".into()],
                        time: 20,
                        rest: 0,
                        rest_string: "Prepare to resume work".into(),
                    },
                ],
                rest_between_sections: 0,
                repeat: true,
                is_custom: None,
            },
            Self {
                id: "basic-workout".into(),
                name: "Quick Full Body Workout".into(),
                description: "A short, effective workout routine hitting all major muscle groups. \
                              Adjust reps and intensity as needed."
                    .into(),
                segments: vec![
                    TimerSegment {
                        name: "Warm-up".into(),
                        work: vec![
                            "Jumping Jacks (30s)".into(),
                            "Arm Circles (30s forward, 30s backward)".into(),
                            "High Knees (30s)".into(),
                        ],
                        time: 30,
                        rest: 0,
                        rest_string: "Prepare for workout".into(),
                    },
                    TimerSegment {
                        name: "Lower Body".into(),
                        work: vec![
                            "Squats (45s)".into(),
                            "Lunges - Right Leg (45s)".into(),
                            "Lunges - Left Leg (45s)".into(),
                            "Glute Bridges (45s)".into(),
                        ],
                        time: 45,
                        rest: 15,
                        rest_string: "Short rest. Next: Upper Body.".into(),
                    },
                    TimerSegment {
                        name: "Upper Body & Core".into(),
                        work: vec![
                            "Push-ups (or Knee Push-ups) (45s)".into(),
                            "Plank (45s)".into(),
                            "Bird-dog (45s)".into(),
                            "Superman (45s)".into(),
                        ],
                        time: 45,
                        rest: 15,
                        rest_string: "Short rest. Next: Cool-down.".into(),
                    },
                    TimerSegment {
                        name: "Cool-down".into(),
                        work: vec![
                            "Overhead Triceps Stretch (30s per arm)".into(),
                            "Hamstring Stretch (30s per leg)".into(),
                            "Child's Pose (60s)".into(),
                        ],
                        time: 60,
                        rest: 0,
                        rest_string: "Workout complete!".into(),
                    },
                ],
                rest_between_sections: 60,
                repeat: false,
                is_custom: None,
            },
        ]
    }

    /// Look up a built-in template by id.
    pub fn builtin(id: &str) -> Option<Self> {
        Self::builtin_templates().into_iter().find(|t| t.id == id)
    }
}
