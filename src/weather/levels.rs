/// Common pressure levels with their typical geopotential heights (km),
/// roughly following GFS. Queries snap to the nearest height.
const LEVEL_TABLE: [(u16, f64); 9] = [
    (300, 9.2),
    (250, 10.4),
    (200, 11.8),
    (150, 13.5),
    (100, 15.8),
    (70, 17.7),
    (50, 19.3),
    (40, 20.0),
    (30, 22.0),
];

/// Snap a flight altitude to the nearest tabulated pressure level. Ties go to
/// the earlier table entry.
pub fn nearest_level_for_alt_km(alt_km: f64) -> u16 {
    let mut best = LEVEL_TABLE[0].0;
    let mut best_d = f64::INFINITY;
    for (level, km) in LEVEL_TABLE {
        let d = (alt_km - km).abs();
        if d < best_d {
            best_d = d;
            best = level;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_typical_balloon_altitudes() {
        assert_eq!(nearest_level_for_alt_km(9.0), 300);
        assert_eq!(nearest_level_for_alt_km(12.0), 200);
        assert_eq!(nearest_level_for_alt_km(16.0), 100);
        assert_eq!(nearest_level_for_alt_km(25.0), 30);
    }

    #[test]
    fn out_of_range_altitudes_clamp_to_table_ends() {
        assert_eq!(nearest_level_for_alt_km(0.0), 300);
        assert_eq!(nearest_level_for_alt_km(40.0), 30);
    }

    #[test]
    fn exact_midpoint_goes_to_the_earlier_entry() {
        // Midpoint between 9.2 (300 hPa) and 10.4 (250 hPa).
        assert_eq!(nearest_level_for_alt_km(9.8), 300);
    }
}
