//! Humanized behavior - wraps deterministic intents with hesitation,
//! skipped jumps, speed variation, evasive hops and a pause after role swaps.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::MovementIntent;
use crate::ai::profiles::HumanizeProfile;

/// How a bot turns the policy's intent into its output
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BehaviorPolicy {
    /// Emit the policy's intent unchanged
    #[default]
    Deterministic,
    /// Filter the intent through a `Humanizer` with this profile
    Humanized(HumanizeProfile),
}

/// Multipliers the actuator applies to move speed and jump strength
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputScale {
    pub speed: f32,
    pub jump: f32,
}

impl OutputScale {
    pub const UNIT: Self = Self {
        speed: 1.0,
        jump: 1.0,
    };
}

impl Default for OutputScale {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Per-tick facts the filter needs besides the intent
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterContext {
    pub now_ms: f32,
    /// Evading while grounded and settled: a random hop may be added
    pub can_hop: bool,
    /// The intent's jump is a stuck recovery and goes out unfiltered
    pub forced_jump: bool,
}

impl FilterContext {
    pub fn at(now_ms: f32) -> Self {
        Self {
            now_ms,
            ..Default::default()
        }
    }
}

/// Per-bot humanizing state. Seeded so a run can be replayed exactly.
#[derive(Clone, Debug)]
pub struct Humanizer {
    pub profile: HumanizeProfile,
    rng: StdRng,
    speed_multiplier: f32,
    /// Jump strength multiplier for the last emitted intent
    jump_scale: f32,
    last_speed_sample_ms: f32,
    hesitate_until_ms: f32,
    pause_until_ms: f32,
}

impl Humanizer {
    pub fn new(profile: HumanizeProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: StdRng::seed_from_u64(seed),
            speed_multiplier: 1.0,
            jump_scale: 1.0,
            last_speed_sample_ms: 0.0,
            hesitate_until_ms: 0.0,
            pause_until_ms: 0.0,
        }
    }

    /// Current speed multiplier for the actuator
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    /// Speed and jump multipliers for the last filtered intent
    pub fn output_scale(&self) -> OutputScale {
        OutputScale {
            speed: self.speed_multiplier,
            jump: self.jump_scale,
        }
    }

    /// Is the bot holding still at `now_ms` (hesitating or paused)?
    pub fn is_holding(&self, now_ms: f32) -> bool {
        now_ms < self.hesitate_until_ms || now_ms < self.pause_until_ms
    }

    /// Hold still for the profile's role swap pause
    pub fn pause_for_role_swap(&mut self, now_ms: f32) {
        self.pause_until_ms = now_ms + self.profile.role_swap_pause_ms;
    }

    /// Filter one tick's intent
    pub fn filter(&mut self, intent: MovementIntent, now_ms: f32) -> MovementIntent {
        self.filter_with(intent, FilterContext::at(now_ms))
    }

    /// Filter one tick's intent with the full tick context
    pub fn filter_with(&mut self, intent: MovementIntent, context: FilterContext) -> MovementIntent {
        let now_ms = context.now_ms;
        self.jump_scale = 1.0;
        if now_ms - self.last_speed_sample_ms > self.profile.speed_resample_ms {
            self.speed_multiplier = self.sample(self.profile.speed_min, self.profile.speed_max);
            self.last_speed_sample_ms = now_ms;
        }

        if context.forced_jump && intent.jump {
            return intent;
        }

        if now_ms >= self.hesitate_until_ms
            && self.rng.gen_bool(self.profile.hesitation_chance.clamp(0.0, 1.0))
        {
            let length = self.sample(self.profile.hesitation_min_ms, self.profile.hesitation_max_ms);
            self.hesitate_until_ms = now_ms + length;
        }

        if self.is_holding(now_ms) {
            return MovementIntent::IDLE;
        }

        let mut intent = intent;
        if intent.jump {
            if self.rng.gen_bool(self.profile.jump_skip_chance.clamp(0.0, 1.0)) {
                intent.jump = false;
            }
        } else if context.can_hop
            && self.rng.gen_bool(self.profile.evasive_hop_chance.clamp(0.0, 1.0))
        {
            intent.jump = true;
            self.jump_scale = self.profile.evasive_hop_strength;
        }
        intent
    }

    fn sample(&mut self, min: f32, max: f32) -> f32 {
        if min < max {
            self.rng.gen_range(min..=max)
        } else {
            min
        }
    }
}
