use std::fmt;

use serde::{Deserialize, Serialize};

/// National dex number of a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub u16);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:03}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl CreatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatureType::Normal => "normal",
            CreatureType::Fire => "fire",
            CreatureType::Water => "water",
            CreatureType::Electric => "electric",
            CreatureType::Grass => "grass",
            CreatureType::Ice => "ice",
            CreatureType::Fighting => "fighting",
            CreatureType::Poison => "poison",
            CreatureType::Ground => "ground",
            CreatureType::Flying => "flying",
            CreatureType::Psychic => "psychic",
            CreatureType::Bug => "bug",
            CreatureType::Rock => "rock",
            CreatureType::Ghost => "ghost",
            CreatureType::Dragon => "dragon",
            CreatureType::Dark => "dark",
            CreatureType::Steel => "steel",
            CreatureType::Fairy => "fairy",
        }
    }
}

/// Immutable catalog entry. Two species are equal when their ids are.
#[derive(Clone, Copy, Debug)]
pub struct Species {
    pub id: CreatureId,
    pub name: &'static str,
    pub primary: CreatureType,
    pub secondary: Option<CreatureType>,
}

impl Species {
    pub const fn new(
        id: u16,
        name: &'static str,
        primary: CreatureType,
        secondary: Option<CreatureType>,
    ) -> Self {
        Self {
            id: CreatureId(id),
            name,
            primary,
            secondary,
        }
    }

    pub fn has_type(&self, kind: CreatureType) -> bool {
        self.primary == kind || self.secondary == Some(kind)
    }
}

impl PartialEq for Species {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Species {}

impl std::hash::Hash for Species {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub fn species_by_id(id: CreatureId) -> Option<Species> {
    catalog::ALL.iter().copied().find(|species| species.id == id)
}

pub fn species_by_name(name: &str) -> Option<Species> {
    catalog::ALL
        .iter()
        .copied()
        .find(|species| species.name.eq_ignore_ascii_case(name))
}

macro_rules! kanto {
    (@secondary) => {
        None
    };
    (@secondary $kind:ident) => {
        Some(CreatureType::$kind)
    };
    ($($ident:ident = $id:literal, $name:literal, $primary:ident $(/ $secondary:ident)?;)*) => {
        $(
            pub const $ident: Species =
                Species::new($id, $name, CreatureType::$primary, kanto!(@secondary $($secondary)?));
        )*

        pub const ALL: &[Species] = &[$($ident),*];
    };
}

/// The 151 Kanto species, typed with their modern type assignments.
pub mod catalog {
    use super::{CreatureType, Species};

    kanto! {
        BULBASAUR = 1, "Bulbasaur", Grass / Poison;
        IVYSAUR = 2, "Ivysaur", Grass / Poison;
        VENUSAUR = 3, "Venusaur", Grass / Poison;
        CHARMANDER = 4, "Charmander", Fire;
        CHARMELEON = 5, "Charmeleon", Fire;
        CHARIZARD = 6, "Charizard", Fire / Flying;
        SQUIRTLE = 7, "Squirtle", Water;
        WARTORTLE = 8, "Wartortle", Water;
        BLASTOISE = 9, "Blastoise", Water;
        CATERPIE = 10, "Caterpie", Bug;
        METAPOD = 11, "Metapod", Bug;
        BUTTERFREE = 12, "Butterfree", Bug / Flying;
        WEEDLE = 13, "Weedle", Bug / Poison;
        KAKUNA = 14, "Kakuna", Bug / Poison;
        BEEDRILL = 15, "Beedrill", Bug / Poison;
        PIDGEY = 16, "Pidgey", Normal / Flying;
        PIDGEOTTO = 17, "Pidgeotto", Normal / Flying;
        PIDGEOT = 18, "Pidgeot", Normal / Flying;
        RATTATA = 19, "Rattata", Normal;
        RATICATE = 20, "Raticate", Normal;
        SPEAROW = 21, "Spearow", Normal / Flying;
        FEAROW = 22, "Fearow", Normal / Flying;
        EKANS = 23, "Ekans", Poison;
        ARBOK = 24, "Arbok", Poison;
        PIKACHU = 25, "Pikachu", Electric;
        RAICHU = 26, "Raichu", Electric;
        SANDSHREW = 27, "Sandshrew", Ground;
        SANDSLASH = 28, "Sandslash", Ground;
        NIDORAN_F = 29, "Nidoran F", Poison;
        NIDORINA = 30, "Nidorina", Poison;
        NIDOQUEEN = 31, "Nidoqueen", Poison / Ground;
        NIDORAN_M = 32, "Nidoran M", Poison;
        NIDORINO = 33, "Nidorino", Poison;
        NIDOKING = 34, "Nidoking", Poison / Ground;
        CLEFAIRY = 35, "Clefairy", Fairy;
        CLEFABLE = 36, "Clefable", Fairy;
        VULPIX = 37, "Vulpix", Fire;
        NINETALES = 38, "Ninetales", Fire;
        JIGGLYPUFF = 39, "Jigglypuff", Normal / Fairy;
        WIGGLYTUFF = 40, "Wigglytuff", Normal / Fairy;
        ZUBAT = 41, "Zubat", Poison / Flying;
        GOLBAT = 42, "Golbat", Poison / Flying;
        ODDISH = 43, "Oddish", Grass / Poison;
        GLOOM = 44, "Gloom", Grass / Poison;
        VILEPLUME = 45, "Vileplume", Grass / Poison;
        PARAS = 46, "Paras", Bug / Grass;
        PARASECT = 47, "Parasect", Bug / Grass;
        VENONAT = 48, "Venonat", Bug / Poison;
        VENOMOTH = 49, "Venomoth", Bug / Poison;
        DIGLETT = 50, "Diglett", Ground;
        DUGTRIO = 51, "Dugtrio", Ground;
        MEOWTH = 52, "Meowth", Normal;
        PERSIAN = 53, "Persian", Normal;
        PSYDUCK = 54, "Psyduck", Water;
        GOLDUCK = 55, "Golduck", Water;
        MANKEY = 56, "Mankey", Fighting;
        PRIMEAPE = 57, "Primeape", Fighting;
        GROWLITHE = 58, "Growlithe", Fire;
        ARCANINE = 59, "Arcanine", Fire;
        POLIWAG = 60, "Poliwag", Water;
        POLIWHIRL = 61, "Poliwhirl", Water;
        POLIWRATH = 62, "Poliwrath", Water / Fighting;
        ABRA = 63, "Abra", Psychic;
        KADABRA = 64, "Kadabra", Psychic;
        ALAKAZAM = 65, "Alakazam", Psychic;
        MACHOP = 66, "Machop", Fighting;
        MACHOKE = 67, "Machoke", Fighting;
        MACHAMP = 68, "Machamp", Fighting;
        BELLSPROUT = 69, "Bellsprout", Grass / Poison;
        WEEPINBELL = 70, "Weepinbell", Grass / Poison;
        VICTREEBEL = 71, "Victreebel", Grass / Poison;
        TENTACOOL = 72, "Tentacool", Water / Poison;
        TENTACRUEL = 73, "Tentacruel", Water / Poison;
        GEODUDE = 74, "Geodude", Rock / Ground;
        GRAVELER = 75, "Graveler", Rock / Ground;
        GOLEM = 76, "Golem", Rock / Ground;
        PONYTA = 77, "Ponyta", Fire;
        RAPIDASH = 78, "Rapidash", Fire;
        SLOWPOKE = 79, "Slowpoke", Water / Psychic;
        SLOWBRO = 80, "Slowbro", Water / Psychic;
        MAGNEMITE = 81, "Magnemite", Electric / Steel;
        MAGNETON = 82, "Magneton", Electric / Steel;
        FARFETCHD = 83, "Farfetch'd", Normal / Flying;
        DODUO = 84, "Doduo", Normal / Flying;
        DODRIO = 85, "Dodrio", Normal / Flying;
        SEEL = 86, "Seel", Water;
        DEWGONG = 87, "Dewgong", Water / Ice;
        GRIMER = 88, "Grimer", Poison;
        MUK = 89, "Muk", Poison;
        SHELLDER = 90, "Shellder", Water;
        CLOYSTER = 91, "Cloyster", Water / Ice;
        GASTLY = 92, "Gastly", Ghost / Poison;
        HAUNTER = 93, "Haunter", Ghost / Poison;
        GENGAR = 94, "Gengar", Ghost / Poison;
        ONIX = 95, "Onix", Rock / Ground;
        DROWZEE = 96, "Drowzee", Psychic;
        HYPNO = 97, "Hypno", Psychic;
        KRABBY = 98, "Krabby", Water;
        KINGLER = 99, "Kingler", Water;
        VOLTORB = 100, "Voltorb", Electric;
        ELECTRODE = 101, "Electrode", Electric;
        EXEGGCUTE = 102, "Exeggcute", Grass / Psychic;
        EXEGGUTOR = 103, "Exeggutor", Grass / Psychic;
        CUBONE = 104, "Cubone", Ground;
        MAROWAK = 105, "Marowak", Ground;
        HITMONLEE = 106, "Hitmonlee", Fighting;
        HITMONCHAN = 107, "Hitmonchan", Fighting;
        LICKITUNG = 108, "Lickitung", Normal;
        KOFFING = 109, "Koffing", Poison;
        WEEZING = 110, "Weezing", Poison;
        RHYHORN = 111, "Rhyhorn", Ground / Rock;
        RHYDON = 112, "Rhydon", Ground / Rock;
        CHANSEY = 113, "Chansey", Normal;
        TANGELA = 114, "Tangela", Grass;
        KANGASKHAN = 115, "Kangaskhan", Normal;
        HORSEA = 116, "Horsea", Water;
        SEADRA = 117, "Seadra", Water;
        GOLDEEN = 118, "Goldeen", Water;
        SEAKING = 119, "Seaking", Water;
        STARYU = 120, "Staryu", Water;
        STARMIE = 121, "Starmie", Water / Psychic;
        MR_MIME = 122, "Mr. Mime", Psychic / Fairy;
        SCYTHER = 123, "Scyther", Bug / Flying;
        JYNX = 124, "Jynx", Ice / Psychic;
        ELECTABUZZ = 125, "Electabuzz", Electric;
        MAGMAR = 126, "Magmar", Fire;
        PINSIR = 127, "Pinsir", Bug;
        TAUROS = 128, "Tauros", Normal;
        MAGIKARP = 129, "Magikarp", Water;
        GYARADOS = 130, "Gyarados", Water / Flying;
        LAPRAS = 131, "Lapras", Water / Ice;
        DITTO = 132, "Ditto", Normal;
        EEVEE = 133, "Eevee", Normal;
        VAPOREON = 134, "Vaporeon", Water;
        JOLTEON = 135, "Jolteon", Electric;
        FLAREON = 136, "Flareon", Fire;
        PORYGON = 137, "Porygon", Normal;
        OMANYTE = 138, "Omanyte", Rock / Water;
        OMASTAR = 139, "Omastar", Rock / Water;
        KABUTO = 140, "Kabuto", Rock / Water;
        KABUTOPS = 141, "Kabutops", Rock / Water;
        AERODACTYL = 142, "Aerodactyl", Rock / Flying;
        SNORLAX = 143, "Snorlax", Normal;
        ARTICUNO = 144, "Articuno", Ice / Flying;
        ZAPDOS = 145, "Zapdos", Electric / Flying;
        MOLTRES = 146, "Moltres", Fire / Flying;
        DRATINI = 147, "Dratini", Dragon;
        DRAGONAIR = 148, "Dragonair", Dragon;
        DRAGONITE = 149, "Dragonite", Dragon / Flying;
        MEWTWO = 150, "Mewtwo", Psychic;
        MEW = 151, "Mew", Psychic;
    }
}
