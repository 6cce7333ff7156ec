//! Normalized-value conversions between host units and fader positions
//!
//! The engine speaks normalized values (0.0..=1.0) on the surface side and
//! host units (amplitude, signed pan) on the facade side. All conversions
//! live here so widgets, actions and tests agree on the exact curves.

/// Fader position of unity gain (0 dB).
pub const UNITY_NORMALIZED: f64 = 0.715;

/// Top of the fader in dB (normalized 1.0).
pub const TOP_DB: f64 = 12.0;

/// Below this the taper switches from exponential-in-dB to linear.
pub const KNEE_DB: f64 = -72.0;

/// Hard floor; at or below this the fader reads 0.0.
pub const FLOOR_DB: f64 = -150.0;

fn knee_normalized() -> f64 {
    // Taper value at KNEE_DB: 0.715^(1 - (-72/12)) = 0.715^7
    UNITY_NORMALIZED.powi(7)
}

/// Convert a host volume (amplitude, 1.0 = 0 dB) to a fader position.
///
/// Exponential in dB between the knee and +12 dB, anchored so that unity
/// gain sits at exactly 0.715; linear from the knee down to the -150 dB
/// floor.
pub fn vol_to_normalized(vol: f64) -> f64 {
    if vol <= 0.0 {
        return 0.0;
    }
    let db = 20.0 * vol.log10();
    if db >= TOP_DB {
        return 1.0;
    }
    if db <= FLOOR_DB {
        return 0.0;
    }
    if db >= KNEE_DB {
        UNITY_NORMALIZED.powf(1.0 - db / TOP_DB)
    } else {
        knee_normalized() * (db - FLOOR_DB) / (KNEE_DB - FLOOR_DB)
    }
}

/// Convert a fader position back to a host volume (amplitude).
pub fn normalized_to_vol(value: f64) -> f64 {
    let value = value.clamp(0.0, 1.0);
    if value <= 0.0 {
        return 0.0;
    }
    let knee = knee_normalized();
    let db = if value >= knee {
        TOP_DB * (1.0 - value.ln() / UNITY_NORMALIZED.ln())
    } else {
        FLOOR_DB + value / knee * (KNEE_DB - FLOOR_DB)
    };
    10f64.powf(db / 20.0)
}

/// Convert host pan (-1.0 = left .. +1.0 = right) to a normalized position.
pub fn pan_to_normalized(pan: f64) -> f64 {
    ((pan + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Convert a normalized position to host pan.
pub fn normalized_to_pan(value: f64) -> f64 {
    (value.clamp(0.0, 1.0) * 2.0) - 1.0
}

/// Format a host volume as a dB string for displays.
pub fn vol_to_string(vol: f64) -> String {
    if vol <= 0.0 {
        return "-inf".to_string();
    }
    let db = 20.0 * vol.log10();
    if db <= FLOOR_DB {
        "-inf".to_string()
    } else {
        format!("{:+.1}dB", db)
    }
}

/// Format a host pan as a display string ("C", "L50", "R20").
pub fn pan_to_string(pan: f64) -> String {
    let pct = (pan.clamp(-1.0, 1.0) * 100.0).round() as i32;
    if pct == 0 {
        "C".to_string()
    } else if pct < 0 {
        format!("L{}", -pct)
    } else {
        format!("R{}", pct)
    }
}
