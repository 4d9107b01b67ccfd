use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SOLO_POINTS: u32 = 0;
pub const PAIR_POINTS: u32 = 3;
pub const CROWD_POINTS: u32 = 1;
/// Extra points for each non-Chuck player who matched the Chuck's answer.
pub const CHUCK_MATCH_BONUS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDelta {
    pub points: u32,
    pub life_lost: bool,
}

/// Points awarded to each member of a word group, by group size.
pub fn base_points(group_size: usize) -> u32 {
    match group_size {
        0 | 1 => SOLO_POINTS,
        2 => PAIR_POINTS,
        _ => CROWD_POINTS,
    }
}

/// Group answers by word. Groups are keyed by the word and their members
/// are sorted, so the result does not depend on map iteration order.
pub fn group_answers(answers: &HashMap<Uuid, String>) -> BTreeMap<&str, Vec<Uuid>> {
    let mut groups: BTreeMap<&str, Vec<Uuid>> = BTreeMap::new();
    for (id, word) in answers {
        groups.entry(word.as_str()).or_default().push(*id);
    }
    for members in groups.values_mut() {
        members.sort();
    }
    groups
}

/// Score one round.
///
/// Players who did not answer get no entry. A lone answer loses a life,
/// a pair earns 3 points each, three or more earn 1 point each. When the
/// Chuck answered, the Chuck earns one extra point per other player in
/// their group and each of those players earns [`CHUCK_MATCH_BONUS`].
pub fn score_round(
    answers: &HashMap<Uuid, String>,
    chuck_id: Option<Uuid>,
) -> HashMap<Uuid, ScoreDelta> {
    let groups = group_answers(answers);
    let mut deltas = HashMap::with_capacity(answers.len());

    for members in groups.values() {
        let points = base_points(members.len());
        let life_lost = members.len() == 1;
        for id in members {
            deltas.insert(*id, ScoreDelta { points, life_lost });
        }
    }

    let chuck_group = chuck_id.and_then(|chuck| {
        answers
            .get(&chuck)
            .and_then(|word| groups.get(word.as_str()))
            .map(|members| (chuck, members))
    });

    if let Some((chuck, members)) = chuck_group {
        let matches = (members.len() - 1) as u32;
        for id in members {
            if let Some(delta) = deltas.get_mut(id) {
                delta.points += if *id == chuck {
                    matches
                } else {
                    CHUCK_MATCH_BONUS
                };
            }
        }
    }

    deltas
}
