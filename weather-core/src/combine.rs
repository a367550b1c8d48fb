use crate::model::Kelvin;

/// Arithmetic mean of the readings, or `None` when there are none.
pub fn mean(readings: &[Kelvin]) -> Option<Kelvin> {
    if readings.is_empty() {
        return None;
    }

    let sum: f64 = readings.iter().map(|k| k.value()).sum();
    Some(Kelvin(sum / readings.len() as f64))
}
