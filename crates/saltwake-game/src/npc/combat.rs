//! NPC combat stats: health, damage, and attack cooldown

use serde::Serialize;

use super::archetype::BaseStats;

/// Seconds between melee strikes
pub const ATTACK_COOLDOWN: f32 = 1.5;

/// Combat statistics for an NPC
#[derive(Debug, Clone, Serialize)]
pub struct CombatStats {
    pub max_hp: f32,
    pub current_hp: f32,
    pub attack: f32,
    pub defense: f32,
    pub attack_cooldown: f32,
    pub attack_timer: f32,
}

/// Result of damaging an NPC
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DamageOutcome {
    pub dealt: f32,
    pub remaining: f32,
    pub knocked_out: bool,
}

impl CombatStats {
    pub fn from_base(stats: &BaseStats) -> Self {
        Self {
            max_hp: stats.max_health,
            current_hp: stats.max_health,
            attack: stats.attack,
            defense: stats.defense,
            attack_cooldown: ATTACK_COOLDOWN,
            attack_timer: 0.0,
        }
    }

    /// HP as a 0.0-1.0 fraction
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        self.current_hp / self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0.0
    }

    /// Apply raw damage reduced by defense, minimum 1
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        let dealt = (amount - self.defense).max(1.0).min(self.current_hp);
        self.current_hp -= dealt;
        DamageOutcome {
            dealt,
            remaining: self.current_hp,
            knocked_out: !self.is_alive(),
        }
    }

    pub fn regenerate(&mut self, amount: f32) {
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
    }

    /// Update attack cooldown timer. Returns true if an attack can fire.
    pub fn update_attack(&mut self, delta: f32) -> bool {
        self.attack_timer -= delta;
        if self.attack_timer <= 0.0 {
            self.attack_timer = self.attack_cooldown;
            true
        } else {
            false
        }
    }

    /// Put the next strike a full cooldown away
    pub fn reset_attack(&mut self) {
        self.attack_timer = self.attack_cooldown;
    }
}
