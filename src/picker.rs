use chrono::NaiveDate;
use rand::Rng;

pub const POOL_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPick {
    pub date_key: String,
    pub item_id: String,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Picks the item of the day. A cached pick is honoured only for the same calendar
/// day and only while its id is still among the candidates; otherwise a fresh draw
/// is taken from the first `POOL_SIZE` candidates.
pub fn pick_daily<T, F, R>(
    today: NaiveDate,
    candidates: &[T],
    cached: Option<&DailyPick>,
    id_of: F,
    rng: &mut R,
) -> Option<(usize, DailyPick)>
where
    F: Fn(&T) -> String,
    R: Rng,
{
    if candidates.is_empty() {
        return None;
    }

    let today_key = date_key(today);
    if let Some(pick) = cached.filter(|pick| pick.date_key == today_key) {
        if let Some(index) = candidates.iter().position(|item| id_of(item) == pick.item_id) {
            return Some((index, pick.clone()));
        }
    }

    let pool = candidates.len().min(POOL_SIZE);
    let index = rng.gen_range(0..pool);
    Some((
        index,
        DailyPick {
            date_key: today_key,
            item_id: id_of(&candidates[index]),
        },
    ))
}
