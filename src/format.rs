use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

pub const UP_GLYPH: &str = "↑";
pub const DOWN_GLYPH: &str = "↓";

const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Fixed-point text with `digits` decimals. Exact binary midpoints round
/// away from zero; everything else rounds to nearest.
pub fn to_fixed(value: f64, digits: u32) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    match midpoint_units(value.abs(), digits) {
        Some(units) => {
            let sign = if value < 0.0 { "-" } else { "" };
            let scale = 10u128.pow(digits);
            if digits == 0 {
                format!("{}{}", sign, units)
            } else {
                format!(
                    "{}{}.{:0width$}",
                    sign,
                    units / scale,
                    units % scale,
                    width = digits as usize
                )
            }
        }
        None => format!("{:.*}", digits as usize, value),
    }
}

/// When `x * 10^digits` lies exactly halfway between two integers, returns
/// the larger one. `x` must be non-negative.
fn midpoint_units(x: f64, digits: u32) -> Option<u128> {
    if !x.is_finite() {
        return None;
    }
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    // x * 10^digits == scaled * 2^(exponent + digits)
    let scaled = (mantissa as u128).checked_mul(5u128.checked_pow(digits)?)?;
    let shift = -(exponent + digits as i32);
    if shift <= 0 || shift > 127 {
        return None;
    }
    let shift = shift as u32;
    let remainder = scaled & ((1u128 << shift) - 1);
    (remainder == 1u128 << (shift - 1)).then(|| (scaled >> shift) + 1)
}

/// Abbreviates a dollar amount. Absent, zero and NaN values have nothing to show.
pub fn format_currency(value: Option<f64>) -> String {
    let v = match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => return "N/A".to_string(),
    };

    for (scale, suffix) in SCALES {
        if v >= scale {
            return format!("{}{}", to_fixed(v / scale, 2), suffix);
        }
    }
    to_fixed(v, 2)
}

pub fn format_quality(score: f64) -> String {
    format!("{}%", to_fixed(score, 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeClass {
    PositiveChange,
    NegativeChange,
}

impl ChangeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeClass::PositiveChange => "positive-change",
            ChangeClass::NegativeChange => "negative-change",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeCell {
    pub text: String,
    pub class: ChangeClass,
}

/// Missing or NaN change counts as zero, and zero counts as a rise.
pub fn format_change(change: Option<f64>) -> ChangeCell {
    let value = match change {
        Some(v) if !v.is_nan() && v != 0.0 => v,
        _ => 0.0,
    };

    let (glyph, class) = if value >= 0.0 {
        (UP_GLYPH, ChangeClass::PositiveChange)
    } else {
        (DOWN_GLYPH, ChangeClass::NegativeChange)
    };

    ChangeCell {
        text: format!("{} {}%", glyph, to_fixed(value, 2)),
        class,
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>, fmt: &str) -> String {
    ts.with_timezone(&Local).format(fmt).to_string()
}
