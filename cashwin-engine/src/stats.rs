use cashwin_db::models::{Draw, NumberStats, Slot, SlotStats};

use crate::history::{chronological, distinct_numbers};

/// Fréquence et écart de chaque numéro vu sur les `window` derniers tirages
/// (tout l'historique si `None`). L'écart compte les tirages écoulés depuis la
/// dernière apparition. Tri par fréquence décroissante puis par numéro.
pub fn compute_stats(draws: &[Draw], window: Option<usize>) -> Vec<NumberStats> {
    let recent = most_recent_first(draws, window);

    let mut stats: Vec<NumberStats> = distinct_numbers(&recent)
        .into_iter()
        .map(|number| NumberStats {
            number,
            frequency: 0,
            gap: 0,
            last_seen: None,
        })
        .collect();

    for (i, d) in recent.iter().enumerate() {
        if let Some(stat) = stats.iter_mut().find(|s| s.number == d.number) {
            stat.frequency += 1;
            if stat.last_seen.is_none() {
                stat.gap = i as u32;
                stat.last_seen = Some(d.date);
            }
        }
    }

    stats.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));
    stats
}

/// Nombre de tirages par franja, dans l'ordre de la journée.
pub fn slot_stats(draws: &[Draw], window: Option<usize>) -> Vec<SlotStats> {
    let recent = most_recent_first(draws, window);
    Slot::ALL
        .iter()
        .map(|&slot| SlotStats {
            slot,
            count: recent.iter().filter(|d| d.slot == slot).count() as u32,
        })
        .collect()
}

fn most_recent_first(draws: &[Draw], window: Option<usize>) -> Vec<Draw> {
    let mut recent = chronological(draws);
    recent.reverse();
    if let Some(n) = window {
        recent.truncate(n);
    }
    recent
}
