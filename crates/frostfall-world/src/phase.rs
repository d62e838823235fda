//! Phase curves for the apocalypse timeline.
//!
//! This module is the phase manager: pure functions that map elapsed days
//! (and, in the collapse phase, collapse progress) onto a phase number and
//! the environmental curves every other system reads.
//!
//! # Timeline
//!
//! | Phase | Progress range | Surface offset at start |
//! |-------|----------------|-------------------------|
//! | 1     | `[0.00, 0.15)` | +10 °C |
//! | 2     | `[0.15, 0.35)` | 0 °C   |
//! | 3     | `[0.35, 0.55)` | -15 °C |
//! | 4     | `[0.55, 0.75)` | -35 °C |
//! | 5     | `[0.75, 1.00]` | -60 °C |
//! | 6     | collapse       | -90 °C to -150 °C |
//!
//! Phase 0 means the apocalypse has not been initialized and is never
//! returned from here. Phase 6 is entered by the apocalypse state in
//! `frostfall-core` once the main timeline is complete; this module
//! supplies its curves.
//!
//! # False calm
//!
//! Around each interior boundary the temperature briefly rebounds by up to
//! +3 °C, peaking exactly at the boundary and fading out 0.03 progress away
//! on either side.

/// Progress values at which each phase starts, plus the terminal 1.0.
pub const PHASE_BOUNDARIES: [f64; 6] = [0.0, 0.15, 0.35, 0.55, 0.75, 1.0];

/// Interior boundaries that carry a false-calm rebound.
const REBOUND_BOUNDARIES: [f64; 4] = [0.15, 0.35, 0.55, 0.75];

/// Half-width of the rebound window in progress units.
const REBOUND_WINDOW: f64 = 0.03;

/// Peak rebound in degrees Celsius.
const REBOUND_PEAK: f64 = 3.0;

/// Surface temperature offset in °C at each boundary.
pub const TEMPERATURE_OFFSET: [f64; 6] = [10.0, 0.0, -15.0, -35.0, -60.0, -90.0];

/// Rendered sun size multiplier at each boundary.
pub const SUN_SCALE: [f64; 6] = [1.0, 0.95, 0.85, 0.7, 0.55, 0.4];

/// Sun brightness multiplier at each boundary.
pub const SUN_BRIGHTNESS: [f64; 6] = [1.0, 0.9, 0.75, 0.6, 0.45, 0.3];

/// Sky light multiplier at each boundary.
pub const SKY_LIGHT: [f64; 6] = [1.0, 0.95, 0.85, 0.7, 0.55, 0.4];

/// Day length multiplier at each boundary.
pub const DAY_LENGTH: [f64; 6] = [1.0, 1.0, 1.1, 1.25, 1.5, 2.0];

/// Geothermal depth modifier control points `(y, °C)`.
pub const DEPTH_POINTS: [(f64, f64); 5] = [
    (-64.0, 80.0),
    (0.0, 30.0),
    (64.0, 0.0),
    (128.0, -4.0),
    (256.0, -10.0),
];

/// Collapse phase temperature at collapse progress 0.0.
pub const COLLAPSE_START_TEMPERATURE: f64 = -90.0;

/// Collapse phase temperature at collapse progress 1.0.
pub const COLLAPSE_END_TEMPERATURE: f64 = -150.0;

/// Collapse progress at which sub-stage 2 begins.
pub const SUB_STAGE_2_AT: f64 = 0.5;

/// Collapse progress at which sub-stage 3 begins.
pub const SUB_STAGE_3_AT: f64 = 0.85;

// ---------------------------------------------------------------------------
// Progress and phase
// ---------------------------------------------------------------------------

/// Main timeline progress for `day` out of `total_days`, clamped to `[0, 1]`.
///
/// A non-positive total means the timeline is already complete.
pub fn progress(day: f64, total_days: f64) -> f64 {
    if total_days <= 0.0 {
        return 1.0;
    }
    (day / total_days).clamp(0.0, 1.0)
}

/// Main-timeline phase (1 through 5) for a progress value.
pub fn phase_for_progress(progress: f64) -> u8 {
    let mut phase: u8 = 1;
    for (index, boundary) in PHASE_BOUNDARIES.iter().enumerate().skip(1).take(4) {
        if progress >= *boundary {
            phase = u8::try_from(index.saturating_add(1)).unwrap_or(5);
        }
    }
    phase
}

/// Main-timeline phase (1 through 5) for `day` out of `total_days`.
pub fn phase(day: f64, total_days: f64) -> u8 {
    phase_for_progress(progress(day, total_days))
}

/// Collapse sub-stage (1 through 3) for a collapse progress value.
pub fn sub_stage(collapse_progress: f64) -> u8 {
    if collapse_progress < SUB_STAGE_2_AT {
        1
    } else if collapse_progress < SUB_STAGE_3_AT {
        2
    } else {
        3
    }
}

/// Whether weather is forced to snow in `phase`.
pub const fn weather_locked(phase: u8, lock_phase: u8) -> bool {
    phase >= lock_phase
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Linear interpolation of a boundary-keyed table at `progress`.
pub fn interpolate(table: &[f64; 6], progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    for (bounds, values) in PHASE_BOUNDARIES.windows(2).zip(table.windows(2)) {
        if let ([lo, hi], [from, to]) = (bounds, values)
            && p <= *hi
        {
            let span = hi - lo;
            if span <= 0.0 {
                return *from;
            }
            return lerp(*from, *to, (p - lo) / span);
        }
    }
    table.last().copied().unwrap_or(0.0)
}

/// Surface temperature offset on the main timeline, including the
/// false-calm rebound.
pub fn temperature_offset(progress: f64) -> f64 {
    interpolate(&TEMPERATURE_OFFSET, progress) + rebound(progress)
}

/// False-calm rebound at `progress`; zero outside every window.
pub fn rebound(progress: f64) -> f64 {
    REBOUND_BOUNDARIES
        .iter()
        .map(|boundary| (progress - boundary).abs())
        .filter(|distance| *distance < REBOUND_WINDOW)
        .map(|distance| REBOUND_PEAK * (1.0 - distance / REBOUND_WINDOW))
        .fold(0.0, f64::max)
}

/// Surface temperature offset during the collapse phase.
pub fn collapse_temperature_offset(collapse_progress: f64) -> f64 {
    lerp(
        COLLAPSE_START_TEMPERATURE,
        COLLAPSE_END_TEMPERATURE,
        collapse_progress.clamp(0.0, 1.0),
    )
}

/// Rendered sun size multiplier.
pub fn sun_scale(progress: f64) -> f64 {
    interpolate(&SUN_SCALE, progress)
}

/// Sun brightness multiplier.
pub fn sun_brightness(progress: f64) -> f64 {
    interpolate(&SUN_BRIGHTNESS, progress)
}

/// Sky light multiplier.
pub fn sky_light(progress: f64) -> f64 {
    interpolate(&SKY_LIGHT, progress)
}

/// Day length multiplier.
pub fn day_length_multiplier(progress: f64) -> f64 {
    interpolate(&DAY_LENGTH, progress)
}

/// Geothermal warmth at height `y`, in °C.
///
/// Piecewise linear through [`DEPTH_POINTS`], clamped to the end values
/// outside the control range.
pub fn depth_modifier(y: i32) -> f64 {
    let y = f64::from(y);
    let (first_y, first_t) = DEPTH_POINTS.first().copied().unwrap_or((0.0, 0.0));
    if y <= first_y {
        return first_t;
    }
    for pair in DEPTH_POINTS.windows(2) {
        if let [(y0, t0), (y1, t1)] = pair
            && y <= *y1
        {
            return lerp(*t0, *t1, (y - y0) / (y1 - y0));
        }
    }
    DEPTH_POINTS.last().map_or(0.0, |(_, t)| *t)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    (to - from).mul_add(t, from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn progress_is_clamped() {
        assert!(close(progress(-5.0, 100.0), 0.0));
        assert!(close(progress(150.0, 100.0), 1.0));
        assert!(close(progress(10.0, 0.0), 1.0));
        assert!(close(progress(25.0, 100.0), 0.25));
    }

    #[test]
    fn phase_is_monotonic_and_capped() {
        let mut last = 0;
        for day in 0..=200 {
            let current = phase(f64::from(day), 100.0);
            assert!(current >= last);
            assert!((1..=5).contains(&current));
            last = current;
        }
        assert_eq!(phase(0.0, 100.0), 1);
        assert_eq!(phase(14.9, 100.0), 1);
        assert_eq!(phase(15.0, 100.0), 2);
        assert_eq!(phase(75.0, 100.0), 5);
        assert_eq!(phase(1000.0, 100.0), 5);
    }

    #[test]
    fn day_fifty_of_hundred_is_phase_three() {
        assert_eq!(phase(50.0, 100.0), 3);
    }

    #[test]
    fn interpolation_hits_table_at_boundaries() {
        for (boundary, expected) in PHASE_BOUNDARIES.iter().zip(SUN_SCALE.iter()) {
            assert!(close(sun_scale(*boundary), *expected));
        }
        assert!(close(interpolate(&TEMPERATURE_OFFSET, 0.25), -7.5));
    }

    #[test]
    fn rebound_peaks_at_boundary_and_fades_at_edges() {
        for (boundary, base) in [(0.15, 0.0), (0.35, -15.0), (0.55, -35.0), (0.75, -60.0)] {
            assert!(close(temperature_offset(boundary), base + 3.0));
        }
        assert!(close(rebound(0.15 + REBOUND_WINDOW), 0.0));
        assert!(close(rebound(0.15 - REBOUND_WINDOW), 0.0));
        assert!(rebound(0.16) > 0.0 && rebound(0.16) < 3.0);
        assert!(close(rebound(0.5), 0.0));
    }

    #[test]
    fn depth_has_floor_and_ceiling() {
        assert!(close(depth_modifier(-64), 80.0));
        assert!(close(depth_modifier(-200), 80.0));
        assert!(close(depth_modifier(0), 30.0));
        assert!(close(depth_modifier(256), -10.0));
        assert!(close(depth_modifier(400), -10.0));
        assert!(close(depth_modifier(-32), 55.0));
    }

    #[test]
    fn depth_is_monotonically_non_increasing() {
        let mut last = f64::INFINITY;
        for y in -100..300 {
            let current = depth_modifier(y);
            assert!(current <= last + 1e-9);
            last = current;
        }
    }

    #[test]
    fn collapse_curves() {
        assert!(close(collapse_temperature_offset(0.0), -90.0));
        assert!(close(collapse_temperature_offset(1.0), -150.0));
        assert!(close(collapse_temperature_offset(0.5), -120.0));
        assert_eq!(sub_stage(0.0), 1);
        assert_eq!(sub_stage(0.5), 2);
        assert_eq!(sub_stage(0.85), 3);
        assert_eq!(sub_stage(1.0), 3);
    }
}
