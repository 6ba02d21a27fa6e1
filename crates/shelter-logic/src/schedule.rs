//! Daily schedule table: which phase an agent should be in at a given hour.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleType {
    /// Sleep 00–07, work 09–18.
    Normal,
    /// Work 00–06, sleep 08–21.
    NightShift,
    /// 8h work / 4h sleep / 12h rest, shifted by a per-agent hour offset.
    Erratic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulePhase {
    Sleep,
    Work,
    Rest,
}

impl SchedulePhase {
    pub fn label(&self) -> &'static str {
        match self {
            SchedulePhase::Sleep => "sleep",
            SchedulePhase::Work => "work",
            SchedulePhase::Rest => "rest",
        }
    }
}

const ERRATIC_WORK_HOURS: u8 = 8;
const ERRATIC_SLEEP_HOURS: u8 = 4;

/// Phase for `hour` (0–23). Work hours fall back to rest when the agent has
/// nothing to work at. Hour ranges are inclusive at both ends.
pub fn phase_at(schedule: ScheduleType, hour: u8, offset: u8, can_work: bool) -> SchedulePhase {
    let hour = hour % 24;
    let work = if can_work {
        SchedulePhase::Work
    } else {
        SchedulePhase::Rest
    };

    match schedule {
        ScheduleType::Normal => match hour {
            0..=7 => SchedulePhase::Sleep,
            9..=18 => work,
            _ => SchedulePhase::Rest,
        },
        ScheduleType::NightShift => match hour {
            0..=6 => work,
            8..=21 => SchedulePhase::Sleep,
            _ => SchedulePhase::Rest,
        },
        ScheduleType::Erratic => {
            let cycle_hour = (hour + offset % 24) % 24;
            if cycle_hour < ERRATIC_WORK_HOURS {
                work
            } else if cycle_hour < ERRATIC_WORK_HOURS + ERRATIC_SLEEP_HOURS {
                SchedulePhase::Sleep
            } else {
                SchedulePhase::Rest
            }
        }
    }
}
