//! Combo declaration normalization and the per-key transition machine

use hashbrown::{HashMap, HashSet};

use crate::ability::{
    Ability, AbilityKind, ComboBehavior, ComboDeclaration, DEFAULT_COMBO_KEY, abilities_equal,
};

/// An ability's combo declarations split into explicit keys and the
/// default ("all") declaration applied to every other tracked key.
#[derive(Debug, Clone)]
pub struct FinalizedComboData {
    pub keyed: Vec<ComboDeclaration>,
    pub default: ComboDeclaration,
}

/// Split `ability`'s raw combo declarations and synthesize the default when
/// none was declared: GCDs break other combos, everything else leaves them
/// alone.
///
/// `continue` declarations are validated against their referenced
/// predecessors; a predecessor that cannot start the same key is a
/// data-authoring problem, logged and ignored.
pub fn complete_combo_data(ability: &Ability) -> FinalizedComboData {
    let mut keyed = Vec::new();
    let mut default = None;

    for decl in &ability.combos {
        validate_continuity(ability, decl);
        if decl.key == DEFAULT_COMBO_KEY {
            default = Some(decl.clone());
        } else {
            keyed.push(decl.clone());
        }
    }

    let default = default.unwrap_or_else(|| {
        let behavior = if matches!(ability.kind, AbilityKind::Gcd) {
            ComboBehavior::Break
        } else {
            ComboBehavior::NoBreak
        };
        ComboDeclaration::default_key(behavior)
    });

    FinalizedComboData { keyed, default }
}

/// Log-only check that every `combo_from` predecessor declares `start` or
/// `continue` for the same key.
fn validate_continuity(ability: &Ability, decl: &ComboDeclaration) {
    let ComboBehavior::Continue { combo_from } = &decl.behavior else {
        return;
    };
    for predecessor in combo_from {
        let can_start = predecessor.combos.iter().any(|p| {
            p.key == decl.key
                && matches!(
                    p.behavior,
                    ComboBehavior::Start | ComboBehavior::Continue { .. }
                )
        });
        if !can_start {
            tracing::warn!(
                ability = %ability.name,
                predecessor = %predecessor.name,
                key = %decl.key,
                "combo continuity mismatch: predecessor cannot start this combo key"
            );
        }
    }
}

/// Per-simulation combo state: one last-matched ability per key, created
/// lazily as keys are first declared.
#[derive(Debug, Default)]
pub struct ComboTracker {
    trackers: HashMap<String, Option<Ability>>,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `ability` against the current combo state, producing the
    /// possibly-overridden ability and advancing the trackers.
    pub fn resolve(&mut self, ability: &Ability) -> Ability {
        let data = complete_combo_data(ability);
        let mut resolved = ability.clone();

        let mut explicit: HashSet<String> = HashSet::new();
        for decl in &data.keyed {
            explicit.insert(decl.key.clone());
            let tracker = self.trackers.entry(decl.key.clone()).or_insert(None);
            Self::transition(tracker, decl, ability, &mut resolved);
        }

        // The default declaration drives the "all" tracker itself (creating
        // it when the behavior establishes state) ...
        if matches!(
            data.default.behavior,
            ComboBehavior::Start | ComboBehavior::Continue { .. }
        ) {
            let tracker = self
                .trackers
                .entry(DEFAULT_COMBO_KEY.to_string())
                .or_insert(None);
            Self::transition(tracker, &data.default, ability, &mut resolved);
        } else if let Some(tracker) = self.trackers.get_mut(DEFAULT_COMBO_KEY) {
            Self::transition(tracker, &data.default, ability, &mut resolved);
        }

        // ... and every other currently-tracked key.
        let other_keys: Vec<String> = self
            .trackers
            .keys()
            .filter(|k| k.as_str() != DEFAULT_COMBO_KEY && !explicit.contains(*k))
            .cloned()
            .collect();
        for key in other_keys {
            let tracker = self.trackers.get_mut(&key).expect("key collected above");
            Self::transition(tracker, &data.default, ability, &mut resolved);
        }

        resolved
    }

    /// Last-matched ability for `key`, if any.
    pub fn last_matched(&self, key: &str) -> Option<&Ability> {
        self.trackers.get(key).and_then(|t| t.as_ref())
    }

    fn transition(
        tracker: &mut Option<Ability>,
        decl: &ComboDeclaration,
        original: &Ability,
        resolved: &mut Ability,
    ) {
        match &decl.behavior {
            ComboBehavior::Start => {
                *tracker = Some(original.clone());
            }
            ComboBehavior::Continue { combo_from } => {
                let continues = tracker
                    .as_ref()
                    .is_some_and(|last| combo_from.iter().any(|c| abilities_equal(c, last)));
                if continues {
                    *tracker = Some(original.clone());
                    decl.overrides.apply(resolved);
                } else {
                    // Fall through to the break rule.
                    *tracker = None;
                }
            }
            ComboBehavior::Break => {
                *tracker = None;
            }
            ComboBehavior::NoBreak => {}
        }
    }
}
