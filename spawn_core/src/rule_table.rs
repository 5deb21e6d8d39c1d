//! The shipped spawn table.

use crate::{
    context::{Condition, Item},
    environment::{Holiday, Season, Weather},
    pool::{RuleError, SpawnRules},
    probability::ProbabilityRule,
    rules::SpawnRulesBuilder,
    species::{catalog::*, CreatureType},
};

/// Screen-off minutes over which the rare pool reaches its full bonus.
pub const RARE_RAMP_MINUTES: u32 = 240;
pub const RARE_RAMP_BONUS: f64 = 10.0;

pub fn default_rules() -> Result<SpawnRules, RuleError> {
    SpawnRulesBuilder::new()
        .pool("common", 60.0, |pool| {
            pool.creature(PIDGEY, 10.0);
            pool.creature(RATTATA, 10.0);
            pool.creature(CATERPIE, 8.0);
            pool.creature(WEEDLE, 8.0);
            pool.creature(SPEAROW, 6.0);
            pool.creature(MAGIKARP, 6.0);
            pool.creature(ODDISH, 5.0);
            pool.creature(BELLSPROUT, 4.0);
            pool.creature(NIDORAN_F, 4.0);
            pool.creature(NIDORAN_M, 4.0);
            pool.creature(GEODUDE, 4.0);
            pool.creature(POLIWAG, 4.0);
            pool.creature(MEOWTH, 4.0);
            pool.creature(EKANS, 3.0);
            pool.creature(DIGLETT, 3.0);
            pool.creature(PARAS, 3.0);
            pool.creature(VENONAT, 3.0).during(Condition::night());
            pool.creature(ZUBAT, 6.0).during(Condition::night());
            pool.modifiers(|m| {
                m.during(Condition::has_item(Item::LeafStone), |e| {
                    e.boost(CreatureType::Grass, 2.0);
                });
            });
        })
        .pool("uncommon", 30.0, |pool| {
            pool.creature(PIKACHU, 3.0);
            pool.creature(PSYDUCK, 4.0);
            pool.creature(GOLDEEN, 3.0);
            pool.creature(SLOWPOKE, 3.0);
            pool.creature(TENTACOOL, 3.0);
            pool.creature(KRABBY, 3.0);
            pool.creature(SANDSHREW, 3.0);
            pool.creature(MANKEY, 3.0);
            pool.creature(MACHOP, 3.0);
            pool.creature(GROWLITHE, 3.0);
            pool.creature(VULPIX, 3.0);
            pool.creature(PONYTA, 3.0);
            pool.creature(DODUO, 3.0);
            pool.creature(ABRA, 2.0);
            pool.creature(DROWZEE, 2.0);
            pool.creature(MAGNEMITE, 2.0);
            pool.creature(EXEGGCUTE, 2.0);
            pool.creature(CUBONE, 2.0);
            pool.creature(HORSEA, 2.0);
            pool.creature(STARYU, 2.0);
            pool.creature(SHELLDER, 2.0);
            pool.creature(JIGGLYPUFF, 2.0);
            pool.creature(EEVEE, 1.0);
            pool.creature(CLEFAIRY, 2.0).during(Condition::night());
            pool.modifiers(|m| {
                m.during(Condition::has_item(Item::Incense), |e| {
                    e.add(EEVEE, 6.0);
                });
            });
        })
        .dynamic_pool(
            "rare",
            ProbabilityRule::increasing_over_minutes(10.0, RARE_RAMP_BONUS, RARE_RAMP_MINUTES),
            |pool| {
                pool.creature(DRATINI, 3.0);
                pool.creature(SCYTHER, 1.0);
                pool.creature(PINSIR, 1.0);
                pool.creature(TAUROS, 1.0);
                pool.creature(KANGASKHAN, 1.0);
                pool.creature(CHANSEY, 1.0);
                pool.creature(LICKITUNG, 1.0);
                pool.creature(FARFETCHD, 1.0);
                pool.creature(MR_MIME, 1.0);
                pool.creature(PORYGON, 1.0);
                pool.creature(DITTO, 1.0);
                pool.creature(OMANYTE, 1.0);
                pool.creature(KABUTO, 1.0);
                pool.creature(AERODACTYL, 0.5);
                pool.creature(SNORLAX, 0.5);
                pool.creature(LAPRAS, 0.5);
                pool.creature(ELECTABUZZ, 1.0);
                pool.creature(MAGMAR, 1.0);
                pool.creature(JYNX, 1.0).during(Condition::season(Season::Winter));
                pool.creature(HITMONLEE, 1.0).during(Condition::streak_at_least(3));
                pool.creature(HITMONCHAN, 1.0).during(Condition::streak_at_least(3));
            },
        )
        .conditional_pool("storm", |pool| {
            pool.creature(PIKACHU, 3.0);
            pool.creature(VOLTORB, 3.0);
            pool.creature(MAGNEMITE, 3.0);
            pool.creature(ELECTABUZZ, 1.0);
            pool.creature(JOLTEON, 0.5);
            pool.activate(15.0)
                .during(Condition::weather(Weather::Thunderstorm));
        })
        .conditional_pool("rain", |pool| {
            pool.creature(PSYDUCK, 3.0);
            pool.creature(POLIWAG, 3.0);
            pool.creature(SLOWPOKE, 2.0);
            pool.creature(TENTACOOL, 2.0);
            pool.creature(POLIWHIRL, 1.0);
            pool.creature(VAPOREON, 0.5);
            pool.activate(10.0).during(Condition::weather(Weather::Rain));
        })
        .conditional_pool("snow", |pool| {
            pool.creature(SEEL, 3.0);
            pool.creature(SHELLDER, 2.0);
            pool.creature(JYNX, 2.0);
            pool.creature(DEWGONG, 1.0);
            pool.creature(LAPRAS, 0.5);
            pool.activate(15.0).during(Condition::weather(Weather::Snow));
        })
        .conditional_pool("night", |pool| {
            pool.creature(GASTLY, 4.0);
            pool.creature(HAUNTER, 2.0);
            pool.creature(GENGAR, 0.5);
            pool.creature(ZUBAT, 3.0);
            pool.creature(GOLBAT, 1.0);
            pool.creature(DROWZEE, 2.0);
            // Full moon first: both activators hold on a full-moon night.
            pool.activate(15.0)
                .during(Condition::night())
                .during(Condition::full_moon());
            pool.activate(8.0).during(Condition::night());
        })
        .conditional_pool("moon", |pool| {
            pool.creature(CLEFAIRY, 4.0);
            pool.creature(JIGGLYPUFF, 3.0);
            pool.creature(NIDORINA, 1.0);
            pool.creature(NIDORINO, 1.0);
            pool.creature(CLEFABLE, 0.5)
                .during(Condition::has_item(Item::MoonStone));
            pool.activate(10.0).during(Condition::has_item(Item::MoonStone));
            pool.activate(5.0).during(Condition::full_moon());
        })
        .conditional_pool("halloween", |pool| {
            pool.creature(GASTLY, 3.0);
            pool.creature(HAUNTER, 2.0);
            pool.creature(GENGAR, 1.0);
            pool.creature(CUBONE, 2.0);
            pool.creature(MAROWAK, 1.0);
            pool.activate(20.0)
                .during(Condition::holiday(Holiday::Halloween));
        })
        .conditional_pool("christmas", |pool| {
            pool.creature(JYNX, 2.0);
            pool.creature(SEEL, 2.0);
            pool.creature(SNORLAX, 1.0);
            pool.creature(LAPRAS, 1.0);
            pool.activate(20.0)
                .during(Condition::holiday(Holiday::Christmas));
        })
        .conditional_pool("low_battery", |pool| {
            pool.creature(PIKACHU, 2.0);
            pool.creature(VOLTORB, 2.0);
            pool.creature(MAGNEMITE, 2.0);
            pool.creature(ELECTRODE, 1.0);
            pool.activate(5.0).during(Condition::battery_at_most(15));
        })
        .conditional_pool("sleepy", |pool| {
            pool.creature(DROWZEE, 3.0);
            pool.creature(SLOWPOKE, 2.0);
            pool.creature(JIGGLYPUFF, 2.0);
            pool.creature(HYPNO, 1.0);
            pool.creature(SNORLAX, 0.5);
            pool.activate(10.0).during(Condition::sleep_bonus());
        })
        .conditional_pool("first_partner", |pool| {
            pool.creature(BULBASAUR, 1.0);
            pool.creature(CHARMANDER, 1.0);
            pool.creature(SQUIRTLE, 1.0);
            pool.activate(100.0).during(Condition::dex_below(1));
        })
        .special(MEW, |pool| {
            pool.activate(0.5)
                .during(Condition::dex_at_least(100))
                .during(Condition::not_found(MEW));
        })
        .special(MEWTWO, |pool| {
            pool.activate(0.5)
                .during(Condition::dex_at_least(140))
                .during(Condition::not_found(MEWTWO));
        })
        .special(ARTICUNO, |pool| {
            pool.activate(1.0)
                .during(Condition::weather(Weather::Snow))
                .during(Condition::dex_at_least(50))
                .during(Condition::not_found(ARTICUNO));
        })
        .special(ZAPDOS, |pool| {
            pool.activate(1.0)
                .during(Condition::weather(Weather::Thunderstorm))
                .during(Condition::dex_at_least(50))
                .during(Condition::not_found(ZAPDOS));
        })
        .special(MOLTRES, |pool| {
            pool.activate(1.0)
                .during(Condition::season(Season::Summer))
                .during(Condition::weather(Weather::Clear))
                .during(Condition::day())
                .during(Condition::dex_at_least(50))
                .during(Condition::not_found(MOLTRES));
        })
        .modifiers(|m| {
            m.during(Condition::weather(Weather::Rain), |e| {
                e.boost(CreatureType::Water, 2.0)
                    .suppress(CreatureType::Fire, 0.5);
            });
            m.during(Condition::weather(Weather::Thunderstorm), |e| {
                e.boost(CreatureType::Electric, 2.0)
                    .boost(CreatureType::Water, 1.5)
                    .suppress(CreatureType::Fire, 0.5);
            });
            m.during(Condition::weather(Weather::Snow), |e| {
                e.boost(CreatureType::Ice, 3.0)
                    .suppress(CreatureType::Grass, 0.5)
                    .suppress(CreatureType::Bug, 0.5);
            });
            m.during(Condition::night(), |e| {
                e.boost(CreatureType::Ghost, 2.0)
                    .boost(CreatureType::Psychic, 1.5);
            });
            m.during(
                Condition::season(Season::Summer)
                    .and(Condition::weather(Weather::Clear))
                    .and(Condition::day()),
                |e| {
                    e.boost(CreatureType::Fire, 1.5);
                },
            );
            m.during(Condition::weekend().and(Condition::day()), |e| {
                e.boost(CreatureType::Normal, 1.5);
            });
            m.during(Condition::streak_at_least(7), |e| {
                e.boost(CreatureType::Fighting, 2.0);
            });
            m.during(Condition::has_item(Item::WaterStone), |e| {
                e.boost(CreatureType::Water, 1.5);
            });
            m.during(Condition::has_item(Item::FireStone), |e| {
                e.boost(CreatureType::Fire, 1.5);
            });
            m.during(Condition::has_item(Item::ThunderStone), |e| {
                e.boost(CreatureType::Electric, 1.5);
            });
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let rules = default_rules().expect("shipped table should validate");
        let static_total: f64 = rules
            .pools()
            .iter()
            .map(|pool| pool.base_percentage)
            .sum();
        assert!((static_total - 100.0).abs() < 1e-9);
        assert_eq!(
            rules.pools().iter().filter(|pool| pool.special).count(),
            5
        );
        assert!(rules.pool("rare").is_some_and(|pool| pool.is_reroll_eligible()));
        assert!(rules.pool("storm").is_some_and(|pool| pool.conditional));
    }
}
