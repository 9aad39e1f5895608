//! Built-in alias seed for commonly traded leagues and teams.
//!
//! Used to pre-populate stores when no external alias store is configured.
//! Operators extend coverage through the store, not by editing this table.

use super::CanonicalNameRecord;
use crate::types::EntityType;

/// Static seed entry.
#[derive(Debug, Clone)]
pub struct SeedRecord {
    pub canonical_key: &'static str,
    pub name_en: &'static str,
    pub name_zh_cn: &'static str,
    pub name_zh_tw: &'static str,
    pub aliases: &'static [&'static str],
}

impl SeedRecord {
    fn to_record(&self) -> CanonicalNameRecord {
        let opt = |s: &'static str| (!s.is_empty()).then(|| s.to_string());
        CanonicalNameRecord {
            canonical_key: self.canonical_key.to_string(),
            name_en: opt(self.name_en),
            name_zh_cn: opt(self.name_zh_cn),
            name_zh_tw: opt(self.name_zh_tw),
            aliases: self.aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

pub static SEED_LEAGUES: &[SeedRecord] = &[
    // England
    SeedRecord {
        canonical_key: "league:premierleague",
        name_en: "Premier League",
        name_zh_cn: "英格兰超级联赛",
        name_zh_tw: "英格蘭超級聯賽",
        aliases: &["English Premier League", "EPL", "英超"],
    },
    SeedRecord {
        canonical_key: "league:championship",
        name_en: "Championship",
        name_zh_cn: "英格兰冠军联赛",
        name_zh_tw: "英格蘭冠軍聯賽",
        aliases: &["English Championship", "EFL Championship", "英冠"],
    },
    // Europe
    SeedRecord {
        canonical_key: "league:laliga",
        name_en: "La Liga",
        name_zh_cn: "西班牙甲级联赛",
        name_zh_tw: "西班牙甲組聯賽",
        aliases: &["Spain Primera Division", "Spanish La Liga", "西甲"],
    },
    SeedRecord {
        canonical_key: "league:bundesliga",
        name_en: "Bundesliga",
        name_zh_cn: "德国甲级联赛",
        name_zh_tw: "德國甲組聯賽",
        aliases: &["German Bundesliga", "Germany Bundesliga", "德甲"],
    },
    SeedRecord {
        canonical_key: "league:seriea",
        name_en: "Serie A",
        name_zh_cn: "意大利甲级联赛",
        name_zh_tw: "意大利甲組聯賽",
        aliases: &["Italy Serie A", "Italian Serie A", "意甲"],
    },
    SeedRecord {
        canonical_key: "league:ligue1",
        name_en: "Ligue 1",
        name_zh_cn: "法国甲级联赛",
        name_zh_tw: "法國甲組聯賽",
        aliases: &["France Ligue 1", "French Ligue 1", "法甲"],
    },
    SeedRecord {
        canonical_key: "league:uefachampionsleague",
        name_en: "UEFA Champions League",
        name_zh_cn: "欧洲冠军联赛",
        name_zh_tw: "歐洲聯賽冠軍盃",
        aliases: &["Champions League", "UCL", "欧冠", "歐聯"],
    },
    // Asia
    SeedRecord {
        canonical_key: "league:j1league",
        name_en: "J1 League",
        name_zh_cn: "日本职业联赛",
        name_zh_tw: "日本職業聯賽",
        aliases: &["Japan J1 League", "J-League Division 1", "日职联"],
    },
    SeedRecord {
        canonical_key: "league:j2league",
        name_en: "J2 League",
        name_zh_cn: "日本乙级联赛",
        name_zh_tw: "日本乙級聯賽",
        aliases: &["Japan J2 League", "J-League Division 2", "日职乙"],
    },
    SeedRecord {
        canonical_key: "league:chinesesuperleague",
        name_en: "Chinese Super League",
        name_zh_cn: "中国超级联赛",
        name_zh_tw: "中國超級聯賽",
        aliases: &["China Super League", "CSL", "中超"],
    },
];

pub static SEED_TEAMS: &[SeedRecord] = &[
    SeedRecord {
        canonical_key: "team:tottenhamhotspur",
        name_en: "Tottenham Hotspur",
        name_zh_cn: "托特纳姆热刺",
        name_zh_tw: "托特納姆熱刺",
        aliases: &["Tottenham", "Spurs", "热刺", "熱刺"],
    },
    SeedRecord {
        canonical_key: "team:manchesterunited",
        name_en: "Manchester United",
        name_zh_cn: "曼彻斯特联",
        name_zh_tw: "曼徹斯特聯",
        aliases: &["Man Utd", "Man United", "曼联", "曼聯"],
    },
    SeedRecord {
        canonical_key: "team:manchestercity",
        name_en: "Manchester City",
        name_zh_cn: "曼彻斯特城",
        name_zh_tw: "曼徹斯特城",
        aliases: &["Man City", "曼城"],
    },
    SeedRecord {
        canonical_key: "team:borussiadortmund",
        name_en: "Borussia Dortmund",
        name_zh_cn: "多特蒙德",
        name_zh_tw: "多蒙特",
        aliases: &["Dortmund", "BVB"],
    },
    SeedRecord {
        canonical_key: "team:bayernmunich",
        name_en: "Bayern Munich",
        name_zh_cn: "拜仁慕尼黑",
        name_zh_tw: "拜仁慕尼黑",
        aliases: &["FC Bayern Munchen", "Bayern", "拜仁"],
    },
    SeedRecord {
        canonical_key: "team:oitatrinita",
        name_en: "Oita Trinita",
        name_zh_cn: "大分三神",
        name_zh_tw: "大分三神",
        aliases: &["Oita"],
    },
    SeedRecord {
        canonical_key: "team:montedioyamagata",
        name_en: "Montedio Yamagata",
        name_zh_cn: "山形山神",
        name_zh_tw: "山形山神",
        aliases: &["Yamagata"],
    },
];

fn table(entity_type: EntityType) -> &'static [SeedRecord] {
    match entity_type {
        EntityType::League => SEED_LEAGUES,
        EntityType::Team => SEED_TEAMS,
    }
}

/// Seed records of one entity type, in table order.
pub fn seed_records(entity_type: EntityType) -> Vec<CanonicalNameRecord> {
    table(entity_type).iter().map(SeedRecord::to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;

    #[test]
    fn test_seed_keys_use_type_prefix() {
        for entity_type in EntityType::ALL {
            for record in seed_records(entity_type) {
                let prefix = format!("{}:", entity_type.key_prefix());
                assert!(record.canonical_key.starts_with(&prefix), "{}", record.canonical_key);
            }
        }
    }

    #[test]
    fn test_seed_keys_unique() {
        for entity_type in EntityType::ALL {
            let mut keys: Vec<String> = seed_records(entity_type)
                .into_iter()
                .map(|r| r.canonical_key)
                .collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), total);
        }
    }

    #[test]
    fn test_seed_keys_match_normalized_english_name() {
        let n = Normalizer::default();
        for entity_type in EntityType::ALL {
            for record in seed_records(entity_type) {
                assert_eq!(record.derived_key(entity_type, &n), record.canonical_key);
            }
        }
    }
}
