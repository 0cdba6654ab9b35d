pub const SAFETY_FACTOR: f32 = 0.7;
pub const MIN_RATE_FLOOR: u32 = 5;
pub const MIN_RATE_CEILING: u32 = 200;

pub fn expected_packet_rate(sample_rate: u32, buffer_size: u16) -> f32 {
    if buffer_size == 0 {
        return 0.0;
    }
    sample_rate as f32 / f32::from(buffer_size)
}

pub fn recommended(sample_rate: u32, buffer_size: u16) -> u32 {
    let raw = (expected_packet_rate(sample_rate, buffer_size) * SAFETY_FACTOR).floor() as u32;
    raw.clamp(MIN_RATE_FLOOR, MIN_RATE_CEILING)
}
