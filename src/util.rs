use chrono::Local;
use rand::Rng;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Random 128-bit identifier rendered as 32 hex digits
pub fn new_id() -> String {
    let value: u128 = rand::thread_rng().gen();
    format!("{value:032x}")
}

/// Local calendar date as `YYYY-MM-DD`
pub fn today_iso() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
