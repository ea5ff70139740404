/// Deterministic xorshift64 PRNG. Chest loot rolls are seeded from map
/// geometry, so a given map always yields the same chest contents.
#[derive(Debug, Clone, Copy)]
struct LootRng {
    state: u64,
}

impl LootRng {
    const fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Random f64 in [0, 1).
    fn next_fraction(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LootRarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl LootRarity {
    fn label(self) -> &'static str {
        match self {
            LootRarity::Common => "common",
            LootRarity::Uncommon => "uncommon",
            LootRarity::Rare => "rare",
            LootRarity::Legendary => "legendary",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LootPayload {
    Gold(u32),
    Weapon(Weapon),
}

#[derive(Debug, Clone, PartialEq)]
struct LootItem {
    payload: LootPayload,
    rarity: LootRarity,
}

impl LootItem {
    fn describe(&self) -> String {
        match &self.payload {
            LootPayload::Gold(amount) => format!("{amount} gold"),
            LootPayload::Weapon(weapon) => {
                format!("{} ({})", weapon.name, self.rarity.label())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct LootEntry {
    payload: LootPayload,
    weight: f64,
    rarity: LootRarity,
}

#[derive(Debug, Clone)]
struct LootTable {
    entries: Vec<LootEntry>,
    guaranteed: Vec<LootItem>,
}

impl LootTable {
    /// Guaranteed items first, then `num_rolls` weighted draws.
    fn roll(&self, rng: &mut LootRng, num_rolls: usize) -> Vec<LootItem> {
        let mut loot: Vec<LootItem> = self.guaranteed.clone();

        let total_weight: f64 = self.entries.iter().map(|entry| entry.weight).sum();
        if total_weight <= 0.0 {
            return loot;
        }

        for _ in 0..num_rolls {
            let roll = rng.next_fraction() * total_weight;
            let mut cursor = 0.0;
            for entry in &self.entries {
                cursor += entry.weight;
                if roll <= cursor {
                    loot.push(LootItem {
                        payload: entry.payload.clone(),
                        rarity: entry.rarity,
                    });
                    break;
                }
            }
        }

        loot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChestKind {
    Basic,
    Rare,
}

#[derive(Debug, Clone)]
struct LootRegistry {
    basic_chest: LootTable,
    rare_chest: LootTable,
}

impl LootRegistry {
    fn new() -> Self {
        let basic_chest = LootTable {
            entries: vec![
                LootEntry {
                    payload: LootPayload::Gold(10),
                    weight: 30.0,
                    rarity: LootRarity::Common,
                },
                LootEntry {
                    payload: LootPayload::Gold(25),
                    weight: 20.0,
                    rarity: LootRarity::Common,
                },
                LootEntry {
                    payload: LootPayload::Gold(50),
                    weight: 10.0,
                    rarity: LootRarity::Uncommon,
                },
                LootEntry {
                    payload: LootPayload::Weapon(Weapon::basic_sword()),
                    weight: 15.0,
                    rarity: LootRarity::Common,
                },
                LootEntry {
                    payload: LootPayload::Weapon(Weapon::steel_sword()),
                    weight: 5.0,
                    rarity: LootRarity::Uncommon,
                },
            ],
            guaranteed: Vec::new(),
        };

        let rare_chest = LootTable {
            entries: vec![
                LootEntry {
                    payload: LootPayload::Gold(50),
                    weight: 25.0,
                    rarity: LootRarity::Uncommon,
                },
                LootEntry {
                    payload: LootPayload::Gold(100),
                    weight: 15.0,
                    rarity: LootRarity::Rare,
                },
                LootEntry {
                    payload: LootPayload::Weapon(Weapon::steel_sword()),
                    weight: 20.0,
                    rarity: LootRarity::Uncommon,
                },
                LootEntry {
                    payload: LootPayload::Weapon(Weapon::legendary_sword()),
                    weight: 10.0,
                    rarity: LootRarity::Rare,
                },
            ],
            guaranteed: vec![LootItem {
                payload: LootPayload::Gold(25),
                rarity: LootRarity::Common,
            }],
        };

        Self {
            basic_chest,
            rare_chest,
        }
    }

    fn chest_loot(&self, kind: ChestKind, rng: &mut LootRng) -> Vec<LootItem> {
        match kind {
            ChestKind::Basic => self.basic_chest.roll(rng, BASIC_CHEST_ROLLS),
            ChestKind::Rare => self.rare_chest.roll(rng, RARE_CHEST_ROLLS),
        }
    }
}

#[derive(Debug, Clone)]
struct ChestState {
    kind: ChestKind,
    bounds: Rect,
    loot: Vec<LootItem>,
    is_opened: bool,
}

impl ChestState {
    fn new(kind: ChestKind, bounds: Rect, loot: Vec<LootItem>) -> Self {
        Self {
            kind,
            bounds,
            loot,
            is_opened: false,
        }
    }

    fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    fn can_interact_from(&self, point: Vec2) -> bool {
        !self.is_opened && distance_between(point, self.center()) <= CHEST_INTERACTION_RADIUS_PX
    }

    /// First open takes the loot; reopening yields nothing.
    fn open(&mut self) -> Vec<LootItem> {
        if self.is_opened {
            return Vec::new();
        }
        self.is_opened = true;
        std::mem::take(&mut self.loot)
    }
}
