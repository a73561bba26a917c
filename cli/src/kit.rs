//! Bundled sample kit
//!
//! A small self-contained job used by the `run` command: a three-step combo,
//! a DoT, a charge-based oGCD, a personal damage window, and a recurring
//! party buff. Enough surface to exercise every engine policy from the
//! command line.

use cadence_core::{
    Ability, Buff, BuffEffects, ComboBehavior, ComboDeclaration, ComboOverrides,
    CooldownDescriptor, DotDescriptor, PartySchedule, StatusIdAllocator,
};

/// The sample kit handed to the rotation driver.
pub struct SampleKit {
    pub rend: Ability,
    pub cleave: Ability,
    pub decimate: Ability,
    pub serrated_wound: Ability,
    pub onslaught: Ability,
    pub battle_cry: Ability,
    pub standard_of_war: Buff,
}

impl SampleKit {
    pub fn new() -> Self {
        let mut status_ids = StatusIdAllocator::new();

        let rend = Ability {
            potency: Some(220.0),
            combos: vec![ComboDeclaration::default_key(ComboBehavior::Start)],
            ..Ability::gcd(101, "Rend")
        };

        let cleave = Ability {
            potency: Some(140.0),
            combos: vec![ComboDeclaration {
                key: cadence_core::DEFAULT_COMBO_KEY.to_string(),
                behavior: ComboBehavior::Continue {
                    combo_from: vec![rend.clone()],
                },
                overrides: ComboOverrides {
                    potency: Some(300.0),
                    activates: None,
                },
            }],
            ..Ability::gcd(102, "Cleave")
        };

        let decimate = Ability {
            potency: Some(160.0),
            combos: vec![ComboDeclaration {
                key: cadence_core::DEFAULT_COMBO_KEY.to_string(),
                behavior: ComboBehavior::Continue {
                    combo_from: vec![cleave.clone()],
                },
                overrides: ComboOverrides {
                    potency: Some(380.0),
                    activates: None,
                },
            }],
            ..Ability::gcd(103, "Decimate")
        };

        let serrated_wound = Ability {
            potency: Some(80.0),
            dot: Some(DotDescriptor {
                id: 1,
                duration: 30.0,
                tick_potency: 45.0,
            }),
            ..Ability::gcd(104, "Serrated Wound")
        };

        let onslaught = Ability {
            potency: Some(130.0),
            cooldown: Some(CooldownDescriptor::charges(30.0, 2)),
            ..Ability::ogcd(105, "Onslaught")
        };

        let fury = status_ids.assign(Buff::personal(
            "Fury",
            20.0,
            BuffEffects::damage(0.10),
        ));
        let battle_cry = Ability {
            potency: None,
            cooldown: Some(CooldownDescriptor::simple(60.0)),
            activates: vec![fury],
            ..Ability::ogcd(106, "Battle Cry")
        };

        let standard_of_war = status_ids.assign(Buff::party(
            "Standard of War",
            20.0,
            BuffEffects::damage(0.05),
            PartySchedule {
                cooldown: 120.0,
                start_time: Some(5.0),
            },
        ));

        Self {
            rend,
            cleave,
            decimate,
            serrated_wound,
            onslaught,
            battle_cry,
            standard_of_war,
        }
    }
}

impl Default for SampleKit {
    fn default() -> Self {
        Self::new()
    }
}
