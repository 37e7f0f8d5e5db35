use eframe::epaint::Color32;

/// Blue → cyan → green → yellow → red, noise floor to strong signal.
const STOPS: [(f32, [u8; 3]); 5] = [
    (0.0, [0, 0, 128]),
    (0.25, [0, 128, 255]),
    (0.5, [0, 255, 0]),
    (0.75, [255, 255, 0]),
    (1.0, [255, 0, 0]),
];

/// Color for a level already normalized to 0.0..=1.0.
pub(crate) fn heat(normalized: f32) -> Color32 {
    let x = if normalized.is_nan() {
        0.0
    } else {
        normalized.clamp(0.0, 1.0)
    };

    for pair in STOPS.windows(2) {
        let (t1, c1) = pair[0];
        let (t2, c2) = pair[1];
        if x <= t2 {
            let t = (x - t1) / (t2 - t1);
            let mix = |a: u8, b: u8| (a as f32 + t * (b as f32 - a as f32)).round() as u8;
            return Color32::from_rgb(mix(c1[0], c2[0]), mix(c1[1], c2[1]), mix(c1[2], c2[2]));
        }
    }
    let [r, g, b] = STOPS[STOPS.len() - 1].1;
    Color32::from_rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_endpoints() {
        assert_eq!(heat(0.0), Color32::from_rgb(0, 0, 128));
        assert_eq!(heat(0.5), Color32::from_rgb(0, 255, 0));
        assert_eq!(heat(1.0), Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn test_heat_clamps_and_interpolates() {
        assert_eq!(heat(-3.0), heat(0.0));
        assert_eq!(heat(7.0), heat(1.0));
        assert_eq!(heat(f32::NAN), heat(0.0));
        assert_eq!(heat(0.625), Color32::from_rgb(128, 255, 0));
    }
}
