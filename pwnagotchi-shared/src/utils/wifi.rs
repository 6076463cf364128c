#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

/// Every channel a unit can hop to across the 2.4, 5 and 6 GHz bands.
pub const NUM_CHANNELS: u16 = 233;

/// Frequency in MHz to channel number.
pub fn freq_to_channel(freq: u32) -> Option<u16> {
  let freq = f64::from(freq);
  let channel = match freq {
    // 2.4 GHz
    2412.0..=2472.0 => ((freq - 2407.0) / 5.0).round(),
    // Channel 14 is special
    2484.0 => 14.0,
    // 5 GHz
    5150.0..=5895.0 => ((freq - 5000.0) / 5.0).round(),
    // 6 GHz
    5955.0..=7115.0 => ((freq - 5950.0) / 5.0).round(),
    _ => return None,
  };

  Some(channel as u16)
}
